// tests/property_based.rs
//
// Property tests for the pure codecs: RGB565 pack/unpack, BMP header
// idempotence, luma bounds, sidecar round-trips.

use camstage::{bmp, metadata::Metadata, Pixel};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_rgb565_pack_unpack_inverse(
        r in (0u16..=31).prop_map(|v| (v * 8) as u8),
        g in (0u16..=63).prop_map(|v| (v * 4) as u8),
        b in (0u16..=31).prop_map(|v| (v * 8) as u8),
    ) {
        // 5/6/5-representable channels survive exactly
        let p = Pixel::new(r, g, b);
        prop_assert_eq!(Pixel::from_rgb565(p.to_rgb565()), p);
        prop_assert_eq!(Pixel::from_rgb565_bytes(p.to_rgb565_bytes()), p);
    }

    #[test]
    fn prop_rgb565_truncation_only_drops_low_bits(
        r in any::<u8>(),
        g in any::<u8>(),
        b in any::<u8>(),
    ) {
        let p = Pixel::new(r, g, b);
        let q = Pixel::from_rgb565(p.to_rgb565());
        prop_assert_eq!(q.r, r & 0xF8);
        prop_assert_eq!(q.g, g & 0xFC);
        prop_assert_eq!(q.b, b & 0xF8);
    }

    #[test]
    fn prop_bmp_dimensions_idempotent(
        width in 1u32..=2048,
        height in 1u32..=2048,
        grayscale in any::<bool>(),
    ) {
        let header = bmp::build_header(width, height, grayscale);
        prop_assert_eq!(bmp::parse_dimensions(&header).unwrap(), (width, height));
        prop_assert_eq!(
            bmp::parse_bits_per_pixel(&header).unwrap(),
            if grayscale { 8 } else { 24 }
        );
        prop_assert_eq!(
            bmp::pixel_array_offset(&header).unwrap(),
            header.len()
        );
    }

    #[test]
    fn prop_grey_stays_in_range(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
        // The fixed-point weights sum to 1023/1024, so 254 is the ceiling
        let grey = Pixel::new(r, g, b).grey();
        prop_assert!(grey <= 254);
        // Monotonic in each channel from black
        prop_assert!(Pixel::new(r, 0, 0).grey() <= Pixel::new(r, g, 0).grey());
    }

    #[test]
    fn prop_sidecar_roundtrip(
        entries in proptest::collection::vec(
            ("[a-z][a-z0-9_-]{0,15}", "[a-zA-Z0-9 ._-]{0,24}"),
            0..8,
        ),
    ) {
        let mut meta = Metadata::new();
        for (k, v) in &entries {
            meta.set(k.clone(), v.clone());
        }
        let parsed = Metadata::from_sidecar(&meta.to_sidecar(), "prop.json").unwrap();
        prop_assert_eq!(parsed, meta);
    }
}
