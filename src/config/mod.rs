pub mod methods;
pub mod yml_settings;
