mod credentials;
mod helpers;
mod session_client;
