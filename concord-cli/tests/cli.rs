// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;

fn concord() -> Command {
    Command::cargo_bin("concord").unwrap()
}

fn workspace(name: &str) -> PathBuf {
    let dir = PathBuf::from(name);
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write a uniform RGB image with an optional painted rectangle (x0, y0, x1, y1)
fn write_image(path: &Path, width: u32, height: u32, paint: Option<(u32, u32, u32, u32)>) {
    let mut image = RgbImage::from_pixel(width, height, Rgb([100, 100, 100]));

    if let Some((x0, y0, x1, y1)) = paint {
        for y in y0..y1 {
            for x in x0..x1 {
                image.put_pixel(x, y, Rgb([255, 100, 100]));
            }
        }
    }

    image.save(path).unwrap();
}

#[test]
fn test_help_and_version() {
    concord().arg("--help").assert().success();
    concord().arg("--version").assert().success();
}

#[test]
fn test_missing_arguments_exit_1() {
    concord().args(["stats", "only_one.png"]).assert().code(1);
    concord().arg("split").assert().code(1);
}

#[test]
fn test_mask() {
    let dir = workspace("TEST_CLI_MASK");
    let source = dir.join("source.png");
    let annotated = dir.join("annotated.png");
    let output = dir.join("mask.png");

    write_image(&source, 20, 10, None);
    write_image(&annotated, 20, 10, Some((2, 2, 7, 7)));

    concord()
        .args(["mask"])
        .arg(&source)
        .arg(&annotated)
        .arg(&output)
        .assert()
        .success();

    let mask = image::open(&output).unwrap().to_luma8();
    assert_eq!(mask.dimensions(), (20, 10));
    assert_eq!(mask.pixels().filter(|p| p.0[0] == 255).count(), 25);
    assert_eq!(mask.get_pixel(2, 2).0[0], 255);
    assert_eq!(mask.get_pixel(7, 7).0[0], 0);

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_mask_missing_file() {
    concord()
        .args(["mask", "TEST_CLI_NOPE_A.png", "TEST_CLI_NOPE_B.png", "TEST_CLI_NOPE.png"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[concord::mask] ERROR"));
}

#[test]
fn test_stats_without_boxes() {
    let dir = workspace("TEST_CLI_STATS");
    let source = dir.join("source.png");
    let annotated = dir.join("annotated.png");
    let predicted = dir.join("predicted.png");

    write_image(&source, 20, 10, None);
    write_image(&annotated, 20, 10, Some((2, 2, 7, 7)));

    concord()
        .arg("mask")
        .arg(&source)
        .arg(&annotated)
        .arg(&predicted)
        .assert()
        .success();

    let expected = "crit\t1\nwidth\t20\nheight\t10\npixels\t200\ntp\t25\nfn\t0\nfp\t0\ntn\t175\n\
                    sens\t1\nspec\t1\nppv\t1\nnpv\t1\nf1\t1\njaccard\t1\nacc\t1\n";

    concord()
        .arg("stats")
        .arg(&source)
        .arg(&annotated)
        .arg(&predicted)
        .assert()
        .success()
        .stdout(expected);

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_stats_with_boxes() {
    let dir = workspace("TEST_CLI_STATS_BOXES");
    let source = dir.join("source.png");
    let annotated = dir.join("annotated.png");
    let predicted = dir.join("predicted.png");
    let boxes = dir.join("boxes.txt");

    write_image(&source, 20, 10, None);
    write_image(&annotated, 20, 10, Some((2, 2, 7, 7)));
    std::fs::write(&boxes, "0 0 10 10\n").unwrap();

    concord()
        .arg("mask")
        .arg(&source)
        .arg(&annotated)
        .arg(&predicted)
        .assert()
        .success();

    // Coverage 0.25 is below the default crit so nothing is filled
    concord()
        .arg("stats")
        .arg(&source)
        .arg(&annotated)
        .arg(&predicted)
        .arg(&boxes)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("crit\t0.95\n"))
        .stdout(predicate::str::contains("fn\t0\n"));

    // The filled box covers rows 0..=9 and columns 0..=10
    concord()
        .arg("stats")
        .arg(&source)
        .arg(&annotated)
        .arg(&predicted)
        .arg(&boxes)
        .arg("0.2")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("crit\t0.2\n"))
        .stdout(predicate::str::contains("tp\t25\nfn\t85\n"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_stats_dimension_mismatch() {
    let dir = workspace("TEST_CLI_STATS_MISMATCH");
    let source = dir.join("source.png");
    let annotated = dir.join("annotated.png");
    let predicted = dir.join("predicted.png");

    write_image(&source, 20, 10, None);
    write_image(&annotated, 20, 10, None);
    write_image(&predicted, 10, 10, None);

    concord()
        .arg("stats")
        .arg(&source)
        .arg(&annotated)
        .arg(&predicted)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("DimensionMismatch"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_split() {
    let dir = workspace("TEST_CLI_SPLIT");
    let source = dir.join("source.png");
    let outdir = dir.join("tiles");

    write_image(&source, 500, 300, None);

    let output = concord()
        .arg("split")
        .arg(&source)
        .arg(&outdir)
        .output()
        .unwrap();

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let paths: Vec<&str> = stdout.lines().collect();
    assert_eq!(paths.len(), 6);

    for path in paths.iter() {
        assert!(path.ends_with(".jpg"));
        let tile = image::open(path).unwrap();
        assert_eq!((tile.width(), tile.height()), (224, 224));
    }

    // Column-major order with the last tile flush against the far edges
    assert!(paths[0].ends_with("-0000-0000.jpg"));
    assert!(paths[1].ends_with("-0000-0076.jpg"));
    assert!(paths[5].ends_with("-0276-0076.jpg"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_split_by_mask() {
    let dir = workspace("TEST_CLI_SPLIT_BY_MASK");
    let source = dir.join("source.png");
    let annotated = dir.join("annotated.png");
    let outdir = dir.join("tiles");

    write_image(&source, 448, 224, None);
    write_image(&annotated, 448, 224, Some((0, 0, 224, 224)));

    let output = concord()
        .arg("split-by-mask")
        .arg(&source)
        .arg(&annotated)
        .arg(&outdir)
        .output()
        .unwrap();

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let rows: Vec<Vec<&str>> = stdout.lines().map(|l| l.split('\t').collect()).collect();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][..2], ["Y", "1.000000"]);
    assert_eq!(rows[1][..2], ["N", "0.000000"]);

    assert!(Path::new(rows[0][2]).is_file());
    assert!(Path::new(rows[1][2]).is_file());
    assert!(outdir.join("Y").is_dir());
    assert!(outdir.join("N").is_dir());

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_split_by_mask_ambiguous_not_written() {
    let dir = workspace("TEST_CLI_SPLIT_AMBIGUOUS");
    let source = dir.join("source.png");
    let annotated = dir.join("annotated.png");
    let outdir = dir.join("tiles");

    write_image(&source, 224, 224, None);
    write_image(&annotated, 224, 224, Some((0, 0, 112, 224)));

    let output = concord()
        .arg("split-by-mask")
        .arg(&source)
        .arg(&annotated)
        .arg(&outdir)
        .args(["0.9", "0.1"])
        .output()
        .unwrap();

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("?\t0.500000\t"));

    let path = stdout.trim_end().split('\t').nth(2).unwrap();
    assert!(!Path::new(path).exists());

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_split_by_mask_rejects_inverted_crit() {
    concord()
        .args(["split-by-mask", "a.png", "b.png", "out", "0.2", "0.8"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[concord::split-by-mask] ERROR"));
}

#[test]
fn test_kappa_two_raters() {
    let dir = workspace("TEST_CLI_KAPPA_TWO");
    let source = dir.join("source.png");
    let first = dir.join("first.png");
    let second = dir.join("second.png");

    write_image(&source, 100, 100, None);
    write_image(&first, 100, 100, Some((0, 0, 50, 50)));
    write_image(&second, 100, 100, Some((0, 0, 50, 50)));

    concord()
        .arg("kappa")
        .arg(&source)
        .arg(&first)
        .arg(&second)
        .assert()
        .success()
        .stdout(format!("{}\tCohen's kappa\t1\n", source.display()));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_kappa_three_raters_with_debug() {
    let dir = workspace("TEST_CLI_KAPPA_THREE");
    let source = dir.join("source.png");
    let debug = dir.join("debug");

    write_image(&source, 100, 100, None);

    let raters: Vec<PathBuf> = (1..=3)
        .map(|i| {
            let path = dir.join(format!("rater{}.png", i));
            write_image(&path, 100, 100, Some((50, 50, 100, 100)));
            path
        })
        .collect();

    concord()
        .arg("kappa")
        .arg(&source)
        .args(&raters)
        .arg("--debug-dir")
        .arg(&debug)
        .assert()
        .success()
        .stdout(format!(
            "Srcfile\tFleiss\tCohen12\tCohen23\tCohen13\n{}\t1\t1\t1\t1\n",
            source.display()
        ));

    for i in 1..=3 {
        assert!(debug.join(format!("rater{}_mask.png", i)).is_file());
        assert!(debug.join(format!("rater{}_salience.png", i)).is_file());
    }

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_kappa_requires_two_raters() {
    concord().args(["kappa", "source.png", "one.png"]).assert().code(1);
}

#[test]
fn test_classify_train_rejects_bad_augmentation() {
    let dir = workspace("TEST_CLI_CLASSIFY_AUGMENT");

    concord()
        .args(["classify", "train"])
        .arg(dir.join("model.safetensors"))
        .arg(&dir)
        .args(["-A", "FX", "-q"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown augmentation 'X'"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_classify_predict_missing_model() {
    concord()
        .args(["classify", "predict", "TEST_CLI_NO_MODEL.safetensors", "image.png", "-q"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[concord::classify::predict] ERROR"));
}
