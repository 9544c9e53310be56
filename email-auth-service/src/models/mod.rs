pub mod intent;

pub use intent::Intent;
