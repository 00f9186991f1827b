use serde::Serialize;

use crate::library::Chart;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Chart { success: bool, data: &'a Chart },
    Health { status: &'a str },
}
