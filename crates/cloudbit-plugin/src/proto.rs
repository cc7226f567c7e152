//! Generated protocol types

#[allow(clippy::all)]
pub mod tfplugin6 {
    tonic::include_proto!("tfplugin6");
}

#[allow(clippy::all)]
pub mod plugin {
    tonic::include_proto!("plugin");
}
