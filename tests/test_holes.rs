//! Integration tests for hole removal.
//!
//! Tests cover:
//! - A disk with a punched centre comes back fully filled
//! - Masks without holes are a fixed point
//! - Corner wedge sizing and the flood fill primitive

mod common;

use image::{GrayImage, Luma};
use planktool::config::HoleRemovalConfig;
use planktool::detection::holes::{self, flood_fill};

use common::*;

#[test]
fn test_disk_with_hole_is_filled() {
    // 1. Disk of radius 50 with a hole of radius 15, away from every corner
    let disk = Disk {
        cx: 100,
        cy: 100,
        r: 50,
    };
    let mask = disk_with_hole_mask(200, disk, 15);
    assert_eq!(mask.get_pixel(100, 100)[0], 0, "fixture should have a hole");

    // 2. Remove holes
    let filled = HoleRemoval::default().apply(&mask);

    // 3. Everything well inside the disk is foreground, everything well
    //    outside is background
    for (x, y, p) in filled.enumerate_pixels() {
        let (dx, dy) = (x as i64 - 100, y as i64 - 100);
        let d2 = dx * dx + dy * dy;
        if d2 <= 47 * 47 {
            assert_eq!(p[0], 255, "pixel ({x}, {y}) inside the disk should be filled");
        } else if d2 >= 53 * 53 {
            assert_eq!(p[0], 0, "pixel ({x}, {y}) outside the disk should stay empty");
        }
    }
}

#[test]
fn test_hole_removal_is_idempotent_without_holes() {
    let mask = square_mask(
        240,
        200,
        &[
            Square {
                x: 30,
                y: 40,
                side: 60,
            },
            Square {
                x: 140,
                y: 90,
                side: 45,
            },
        ],
    );
    let holes = HoleRemoval::default();

    let once = holes.apply(&mask);
    let twice = holes.apply(&once);

    assert_eq!(once, mask, "solid squares should survive unchanged");
    assert_eq!(twice, once);
}

#[test]
fn test_nested_ring_becomes_solid() {
    // Ring inside a ring: both gaps are enclosed
    let mask = GrayImage::from_fn(160, 160, |x, y| {
        let d = (x as i64 - 80).abs().max((y as i64 - 80).abs());
        if (40..=50).contains(&d) || (10..=20).contains(&d) {
            Luma([255])
        } else {
            Luma([0])
        }
    });

    let filled = HoleRemoval::default().apply(&mask);

    for y in 30..=130 {
        for x in 30..=130 {
            assert_eq!(filled.get_pixel(x, y)[0], 255, "({x}, {y}) should be filled");
        }
    }
    assert_eq!(filled.get_pixel(5, 5)[0], 0);
}

#[test]
fn test_wedge_side_follows_width() {
    let holes = HoleRemoval::default();
    assert_eq!(holes.wedge_side(200), 10);
    assert_eq!(holes.wedge_side(10), 0);

    let no_wedges = HoleRemoval::new(&HoleRemovalConfig {
        kernel_size: 5,
        corner_fraction: 0.0,
    });
    assert_eq!(no_wedges.wedge_side(1000), 0);
}

#[test]
fn test_corner_wedges_paint_corners_only() {
    let mut img = GrayImage::from_pixel(50, 40, Luma([255]));
    holes::paint_corner_wedges(&mut img, 6, Luma([0]));

    assert_eq!(img.get_pixel(0, 0)[0], 0);
    assert_eq!(img.get_pixel(49, 0)[0], 0);
    assert_eq!(img.get_pixel(0, 39)[0], 0);
    assert_eq!(img.get_pixel(49, 39)[0], 0);
    assert_eq!(img.get_pixel(25, 20)[0], 255);
    assert_eq!(img.get_pixel(10, 10)[0], 255);
}

#[test]
fn test_flood_fill_is_four_connected() {
    // Two black cells touching only diagonally
    let mut img = GrayImage::from_pixel(4, 4, Luma([255]));
    img.put_pixel(1, 1, Luma([0]));
    img.put_pixel(2, 2, Luma([0]));

    flood_fill(&mut img, (1, 1), Luma([128]));

    assert_eq!(img.get_pixel(1, 1)[0], 128);
    assert_eq!(img.get_pixel(2, 2)[0], 0, "diagonal neighbour must not be reached");
    assert_eq!(img.get_pixel(0, 0)[0], 255);
}
