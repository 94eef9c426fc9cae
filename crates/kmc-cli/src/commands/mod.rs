pub mod rates;
pub mod run;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const PHYSICS_TOML: &str = r#"
thermal-energy = 0.025

[box]
x = 4.0
y = 10.0
z = 10.0

[rates]
singlet-attempt-frequency = 1e9
forster-radius = 2.0
singlet-lifetime = 1e-9
triplet-lifetime = 1e-6
exciton-binding-energy = 0.5
ct-binding-energy = 0.2
electron = { attempt-frequency = 1e12, inverse-localization-length = 2.0 }
hole = { attempt-frequency = 1e12, inverse-localization-length = 2.0 }
triplet = { attempt-frequency = 1e11, inverse-localization-length = 5.0 }
"#;

    const SITES_CSV: &str = "\
x,y,z,electron,hole,singlet,triplet,species
0,0,0,-3.0,-5.5,2.0,1.5,donor
1,0,0,-3.0,-5.5,2.0,1.5,donor
2,0,0,-3.0,-5.5,2.0,1.5,donor
3,0,0,-3.0,-5.5,2.0,1.5,donor
";

    /// A four-site single-species ring on disk plus a run file pointing at it.
    pub(crate) fn system_dir(simulation: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("physics.toml"), PHYSICS_TOML).unwrap();
        fs::write(dir.path().join("sites.csv"), SITES_CSV).unwrap();
        fs::write(dir.path().join("short.csv"), "i,j\n0,1\n1,2\n2,3\n3,0\n").unwrap();
        fs::write(dir.path().join("long.csv"), "i,j\n0,2\n1,3\n").unwrap();
        let run_file = dir.path().join("run.toml");
        fs::write(
            &run_file,
            format!(
                "[system]\nphysics = \"physics.toml\"\nsites = \"sites.csv\"\n\
                 short-range-pairs = \"short.csv\"\nlong-range-pairs = \"long.csv\"\n\n{simulation}"
            ),
        )
        .unwrap();
        (dir, run_file)
    }
}
