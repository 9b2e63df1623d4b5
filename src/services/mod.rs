pub mod invoice;
pub mod ledger;
pub mod pin_lock;
pub mod state;
