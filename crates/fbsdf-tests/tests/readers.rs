//! Integration tests for the two ready-made consumers: the PBRT-style
//! table builder and the standard first-basis-function reader.

use fbsdf_decoder::{DecodeError, PbrtBsdfReader, read_standard_bsdf};
use fbsdf_tests::{FIXTURES, open_fixture};

// ── PBRT tables ───────────────────────────────────────────────────────────────

#[test]
fn pbrt_table_for_monochrome_glass() {
    let table = PbrtBsdfReader::read(open_fixture("mono_glass").unwrap()).unwrap();

    assert_eq!(table.eta, 1.5046);
    assert_eq!(table.m_max, 6);
    assert_eq!(table.n_channels, 1);
    assert_eq!(table.mu, [-1.0, -0.5, -0.1, 0.1, 0.5, 1.0]);
    assert_eq!(table.cdf.len(), 36);
    assert_eq!(table.a.len(), 91);
    assert!(table.a0.iter().all(|&a0| a0 == 1.0));

    // Cell order is min(i, o) + 1.
    let (m, ak) = table.get_ak(4, 2);
    assert_eq!(m, 3);
    assert_eq!(&ak[..m], &[1.0, 0.5, 0.25]);
}

#[test]
fn pbrt_table_for_rgb_grid() {
    let table = PbrtBsdfReader::read(open_fixture("rgb_grid").unwrap()).unwrap();

    assert_eq!(table.n_channels, 3);
    assert_eq!(table.m_max, 3);
    assert_eq!(table.m.len(), 25);
    assert!(table.m.iter().all(|&m| (1..=3).contains(&m)));

    // Cell (i = 2, o = 0) has order 1 + (2 + 0) % 3 = 3: luminance, red, blue.
    let (m, ak) = table.get_ak(2, 0);
    assert_eq!(m, 3);
    assert_eq!(
        &ak[..m * 3],
        &[1.0, 0.5, 1.0 / 3.0, 2.0, 1.0, 2.0 / 3.0, 3.0, 1.5, 1.0]
    );
}

#[test]
fn pbrt_reader_accepts_only_uniform_materials() {
    for fixture in &FIXTURES {
        let result = PbrtBsdfReader::read(fixture.open().unwrap());
        let supported = fixture.params.num_basis_functions == 1
            && matches!(fixture.params.num_color_channels, 1 | 3);
        match result {
            Ok(_) => assert!(supported, "{} should be refused", fixture.name),
            Err(DecodeError::Rejected(_)) => assert!(!supported, "{} should load", fixture.name),
            Err(e) => panic!("{}: unexpected error {e}", fixture.name),
        }
    }
}

// ── Standard reader ───────────────────────────────────────────────────────────

#[test]
fn standard_reader_on_rgb_grid() {
    let bsdf = read_standard_bsdf(open_fixture("rgb_grid").unwrap()).unwrap();

    assert_eq!(bsdf.elevational_samples, [-1.0, -0.5, 0.0, 0.5, 1.0]);
    assert_eq!(bsdf.num_color_channels, 3);
    assert_eq!(bsdf.series.len(), 25);
    assert_eq!(bsdf.y_coefficients.len(), 50);

    // Channel `c` of every coefficient is (c + 1) / (order + 1).
    for extent in &bsdf.series {
        for order in 0..extent.length {
            let at = extent.offset + order;
            let expected = |channel: usize| (channel + 1) as f32 / (order + 1) as f32;
            assert_eq!(bsdf.y_coefficients[at], expected(0));
            assert_eq!(bsdf.r_coefficients[at], expected(1));
            assert_eq!(bsdf.b_coefficients[at], expected(2));
        }
    }
    assert_eq!(bsdf.roughness_top, 0.1);
}

#[test]
fn standard_reader_keeps_the_first_basis_function() {
    let bsdf = read_standard_bsdf(open_fixture("textured").unwrap()).unwrap();

    assert_eq!(bsdf.cdf.len(), 9);
    assert_eq!(bsdf.y_coefficients, [1.0f32, 0.25].repeat(9));
    assert_eq!(bsdf.roughness_top, 0.5);
    assert_eq!(bsdf.roughness_bottom, 0.25);
}

#[test]
fn standard_and_pbrt_agree_on_a_single_channel_file() {
    let bsdf = read_standard_bsdf(open_fixture("mono_glass").unwrap()).unwrap();
    let table = PbrtBsdfReader::read(open_fixture("mono_glass").unwrap()).unwrap();

    assert_eq!(bsdf.y_coefficients, table.a);
    assert_eq!(bsdf.cdf, table.cdf);
    for (extent, (&offset, &m)) in bsdf.series.iter().zip(table.a_offset.iter().zip(&table.m)) {
        assert_eq!(extent.offset, offset);
        assert_eq!(extent.length, m);
    }
}

#[test]
fn standard_reader_rejections_on_fixtures() {
    let message = |name: &str| match read_standard_bsdf(open_fixture(name).unwrap()) {
        Err(DecodeError::Rejected(m)) => m,
        other => panic!("{name}: expected a rejection, got {other:?}"),
    };

    assert_eq!(message("empty"), "the input does not contain any basis functions");
    assert_eq!(message("minimal"), "the input must contain at least 3 elevational samples");
}
