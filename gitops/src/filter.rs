use flow_defs::Manifest;

const LATEST_TAG: &str = "latest";

/// Whether an image `version` should be rolled out to `manifest`.
pub fn should_process(manifest: &Manifest, version: &str) -> bool {
    if version.is_empty() || version == LATEST_TAG {
        return false;
    }

    let filters = &manifest.filters;
    if filters.matches_any_exclude_prefix(version) {
        return false;
    }

    if filters.include_prefixes.is_empty() {
        return true;
    }

    filters.matches_any_include_prefix(version)
}
