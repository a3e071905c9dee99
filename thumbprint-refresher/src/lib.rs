//! Refreshes the thumbprint lists of IAM OpenID Connect providers from the
//! certificates their key-distribution endpoints currently serve.

pub mod refresh;
