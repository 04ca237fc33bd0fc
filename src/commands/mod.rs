pub mod beacon;
pub mod encode;
pub mod passcode;
pub mod settings;

pub use beacon::{BeaconArgs, handle_beacon};
pub use encode::handle_encode;
pub use passcode::handle_passcode;
pub use settings::{SettingsUpdate, handle_settings_set, handle_settings_show};
