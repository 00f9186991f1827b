use std::fmt::Display;

use serde::Serialize;
use uuid::Uuid;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection::new(&self.error)
    }
}

impl reject::Reject for Rejection {}

/// The body of every error response.
#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    pub(crate) detail: String,
}

impl FlattenedRejection {
    pub fn new(error: impl Display) -> Self {
        FlattenedRejection {
            detail: error.to_string(),
        }
    }
}

/// What the failed request was doing. Only logged.
#[derive(Clone, Debug)]
pub enum Context {
    Chart { request: Uuid },
}

impl Context {
    pub fn chart(request: Uuid) -> Context {
        Context::Chart { request }
    }
}
