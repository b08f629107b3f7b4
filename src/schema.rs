use serde::Deserialize;

// Request body for POST /register and POST /login. Not Debug: carries a plaintext password.
#[derive(Deserialize)]
pub struct CredentialsSchema {
    pub username: String,
    pub password: String,
}

// Request body for creating a new Todo
#[derive(Debug, Deserialize)]
pub struct CreateTodoSchema {
    pub title: Option<String>,
}

// Request body for updating a Todo; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoSchema {
    pub title: Option<String>,
    pub completed: Option<bool>,
}
