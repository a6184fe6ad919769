pub mod composer_input;
pub mod popup_menu;
pub mod status_line;
pub mod transcript;
