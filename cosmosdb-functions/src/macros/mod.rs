mod cosmos_db_trigger;

pub use cosmos_db_trigger::invoke_template;
