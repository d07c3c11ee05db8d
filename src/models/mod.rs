pub mod head;
pub mod loaders;
pub mod order;

pub use head::HeadOption;
pub use loaders::load_orders;
pub use order::{Order, OrderRow};
