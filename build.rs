// build.rs

fn main() {
    // Generate build info for `system-monitor version`
    vergen::EmitBuilder::builder()
        .all_build()
        .all_git()
        .emit()
        .expect("Unable to generate build info");
}
