pub mod orders;
pub mod products;
pub mod profiles;

pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use profiles::Entity as Profiles;
