use verlet::scenarios::{CollisionBox, Scenario};

mod shared;

#[macroquad::main("verlet")]
async fn main() {
    use macroquad::window::next_frame;
    shared::setup();

    let scenario = CollisionBox { particles: 256 };
    let mut world = scenario.create();

    loop {
        scenario.update(&mut world);
        world.update();
        {
            use shared::draw::Draw;
            world.draw();
        }
        next_frame().await;
    }
}
