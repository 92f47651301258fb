use glam::DVec2;
use macroquad::color::{Color, GRAY, WHITE};
use verlet::{ConstraintKind, World};

fn draw_vec_line(from: DVec2, to: DVec2, thickness: f32, color: Color) {
    use macroquad::shapes::draw_line;
    draw_line(
        from.x as f32,
        from.y as f32,
        to.x as f32,
        to.y as f32,
        thickness,
        color,
    );
}

pub trait Draw {
    fn draw(&self);
}

impl Draw for World<DVec2> {
    fn draw(&self) {
        use macroquad::shapes::draw_circle_lines;

        for (_, spring) in self.constraints(ConstraintKind::Spring) {
            let (Some(a), Some(b)) = (self.particle(spring.a()), self.particle(spring.b())) else {
                continue;
            };
            draw_vec_line(a.position(), b.position(), 1.0, GRAY);
        }
        for (_, particle) in self.particles() {
            let pos = particle.position();
            draw_circle_lines(pos.x as f32, pos.y as f32, particle.radius() as f32, 1.0, WHITE);
        }
    }
}
