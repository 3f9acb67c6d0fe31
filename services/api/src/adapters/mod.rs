pub mod db;
pub mod mailer;
pub mod sanity;
pub mod stripe;

pub use db::DbAdapter;
pub use mailer::HttpMailer;
pub use sanity::SanityStore;
pub use stripe::StripeGateway;
