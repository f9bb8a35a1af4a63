pub mod google_form;
pub mod sink;
