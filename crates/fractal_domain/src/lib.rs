mod adapters;
pub use adapters::{
    CodeGenerator, GenerateFuture, ProjectChange, ProjectChangeSink, ProjectStore,
};
mod actions;
pub use actions::Action;
mod effects;
pub use effects::Effect;
mod project_list;
pub use project_list::ProjectList;

mod state;
pub use state::*;

mod reducer;
pub use reducer::derive_project_title;

pub const PROJECT_TITLE_MAX_CHARS: usize = 60;
pub const UNTITLED_PROJECT_TITLE: &str = "Untitled Project";
