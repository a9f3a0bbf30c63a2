//! NutriKids — recipe suggestions for selective eaters, over chat.

pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
pub mod recipes;
pub mod store;
