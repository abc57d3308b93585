use std::fs;

use frame_manager_io::{collect_point_clouds, copy_point_clouds, POINT_CLOUD_DIR};

#[test]
fn copies_prefixed_clouds_into_the_acquisition() {
    let src = tempfile::tempdir().unwrap();
    fs::create_dir_all(src.path().join("strips")).unwrap();
    fs::write(src.path().join("strips/b.LAS"), b"b").unwrap();
    fs::write(src.path().join("strips/a.laz"), b"a").unwrap();
    fs::write(src.path().join("20240501-Nyon_c.laz"), b"c").unwrap();
    fs::write(src.path().join("readme.txt"), b"-").unwrap();

    let files = collect_point_clouds(src.path()).unwrap();
    assert_eq!(files.len(), 3);

    let out = tempfile::tempdir().unwrap();
    let root = out.path().join("20240501-Nyon");
    let copied = copy_point_clouds(&root, "20240501-Nyon", &files).unwrap();
    assert_eq!(copied, 3);

    let mut names: Vec<_> = fs::read_dir(root.join(POINT_CLOUD_DIR))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        [
            "20240501-Nyon_a.laz",
            "20240501-Nyon_b.LAS",
            "20240501-Nyon_c.laz"
        ]
    );

    // Copying the archived files onto themselves is a no-op.
    let archived = collect_point_clouds(&root.join(POINT_CLOUD_DIR)).unwrap();
    assert_eq!(copy_point_clouds(&root, "20240501-Nyon", &archived).unwrap(), 0);
}

#[test]
fn single_file_argument_is_used_as_is() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("one.laz");
    fs::write(&file, b"x").unwrap();
    let files = collect_point_clouds(&file).unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("one.laz"));
}
