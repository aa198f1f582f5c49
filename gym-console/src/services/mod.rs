//! 服务层 - registry views and administration
//!
//! - [`members`] - search, subscription calendar, deletion
//! - [`staff`] - staff directory and credentials
//! - [`settings`] - display currency

pub mod members;
pub mod settings;
pub mod staff;

pub use members::{MemberStanding, delete_member, expiry_calendar, search};
pub use settings::{current_currency, set_currency, set_currency_code};
pub use staff::{add_staff, remove_staff};
