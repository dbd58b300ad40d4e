//! Wire messages and generated service bindings for `pikcel.v1`.

#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct CanvasGetRequest {}

#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct CanvasGetResponse {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(int32, tag = "2")]
    pub width: i32,
    #[prost(int32, tag = "3")]
    pub height: i32,
}

include!(concat!(env!("OUT_DIR"), "/pikcel.v1.Api.rs"));

impl From<crate::api::Canvas> for CanvasGetResponse {
    fn from(canvas: crate::api::Canvas) -> Self {
        Self {
            id: canvas.id.to_string(),
            width: canvas.width,
            height: canvas.height,
        }
    }
}
