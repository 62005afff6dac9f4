//! Bake `LINKPANEL_*` variables from a local `.env` file into the simulator
//! binary so credentials never have to live in the source tree.

fn main() {
    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rerun-if-changed=../../.env");

    let Ok(vars) = dotenvy::dotenv_iter() else {
        return;
    };

    for (key, value) in vars.flatten() {
        if key.starts_with("LINKPANEL_") {
            println!("cargo:rustc-env={key}={value}");
        }
    }
}
