pub mod point;
pub mod record;
pub mod zone;

pub trait ExampleData {
    fn example_data() -> Self;
}
