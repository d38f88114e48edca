// getzap-core/src/platform.rs
//! Infers the platform an asset targets from its file name and decides
//! whether it suits the local host.
use getzap_common::model::{HostPlatform, PlatformTag};
use tracing::debug;

/// Checked in order, first hit wins. The leading `-` is part of each needle.
const OS_NEEDLES: &[(&[&str], &str)] = &[
    (&["-windows", "-win"], "windows"),
    (&["-darwin", "-mac", "-osx"], "darwin"),
    (&["-linux"], "linux"),
];

const ARCH_NEEDLES: &[(&[&str], &str)] = &[
    (&["-amd64", "-x64", "-x86_64"], "amd64"),
    (&["-arm64", "-aarch64"], "arm64"),
];

fn first_match(name: &str, table: &[(&[&str], &'static str)]) -> Option<&'static str> {
    table
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| name.contains(needle)))
        .map(|(_, value)| *value)
}

/// Case-sensitive. Names with no recognizable marker come back unconstrained.
pub fn determine_tag(asset_name: &str) -> PlatformTag {
    PlatformTag::new(
        first_match(asset_name, OS_NEEDLES),
        first_match(asset_name, ARCH_NEEDLES),
    )
}

/// An empty OS matches every host. A set OS must equal the host OS, and a set
/// arch must then equal the host arch.
pub fn matches(tag: &PlatformTag, host_os: &str, host_arch: &str) -> bool {
    match (&tag.os, &tag.arch) {
        (None, _) => true,
        (Some(os), _) if os != host_os => false,
        (Some(_), None) => true,
        (Some(_), Some(arch)) => arch == host_arch,
    }
}

pub fn is_local_asset(asset_name: &str, host: &HostPlatform) -> bool {
    let tag = determine_tag(asset_name);
    let local = matches(&tag, &host.os, &host.arch);
    debug!(
        "Asset '{}' [{}] {} host {}",
        asset_name,
        tag,
        if local { "matches" } else { "does not match" },
        host
    );
    local
}
