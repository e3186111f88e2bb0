use crate::location::Directory;

pub struct AppState {
    pub directory: Box<dyn Directory>,
}
