//! Generates the gRPC bindings for the `pikcel.v1.Api` service.
//!
//! Messages are plain prost structs in `src/grpc/pb.rs`, so only the
//! service glue is generated here and no `protoc` is needed.

fn main() {
    let api = tonic_build::manual::Service::builder()
        .name("Api")
        .package("pikcel.v1")
        .method(
            tonic_build::manual::Method::builder()
                .name("canvas_get")
                .route_name("CanvasGet")
                .input_type("crate::grpc::pb::CanvasGetRequest")
                .output_type("crate::grpc::pb::CanvasGetResponse")
                .codec_path("tonic::codec::ProstCodec")
                .build(),
        )
        .build();

    tonic_build::manual::Builder::new().compile(&[api]);
}
