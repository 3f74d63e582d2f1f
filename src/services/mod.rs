pub mod habits;
pub mod seed;

pub use habits::HabitService;
pub use seed::seed_demo_data;
