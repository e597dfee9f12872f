use std::io::Read;

use fbsdf_wire::section::body_len;
use fbsdf_wire::{BsdfHeader, HEADER_SIZE, ScalarReader, Section};

use crate::error::DecodeError;

/// Which body sections a handler wants materialised.
///
/// Sections left `false` are skipped byte-for-byte: the engine still
/// consumes their exact length (so truncation is still detected) but
/// allocates nothing, validates nothing, and fires no callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ParseOptions {
    pub parse_elevational_samples: bool,
    pub parse_parameter_sample_counts: bool,
    pub parse_parameter_values: bool,
    pub parse_cdf: bool,
    pub parse_series: bool,
    pub parse_coefficients: bool,
    pub parse_metadata: bool,
}

impl ParseOptions {
    /// Materialise every section.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            parse_elevational_samples: true,
            parse_parameter_sample_counts: true,
            parse_parameter_values: true,
            parse_cdf: true,
            parse_series: true,
            parse_coefficients: true,
            parse_metadata: true,
        }
    }

    /// Skip every section.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            parse_elevational_samples: false,
            parse_parameter_sample_counts: false,
            parse_parameter_values: false,
            parse_cdf: false,
            parse_series: false,
            parse_coefficients: false,
            parse_metadata: false,
        }
    }

    /// Materialise one section and skip the rest.
    #[must_use]
    pub fn only(section: Section) -> Self {
        Self::none().with(section, true)
    }

    #[must_use]
    pub fn with(mut self, section: Section, parse: bool) -> Self {
        *self.flag_mut(section) = parse;
        self
    }

    #[must_use]
    pub fn parses(self, section: Section) -> bool {
        match section {
            Section::ElevationalSamples => self.parse_elevational_samples,
            Section::ParameterSampleCounts => self.parse_parameter_sample_counts,
            Section::ParameterValues => self.parse_parameter_values,
            Section::Cdf => self.parse_cdf,
            Section::Series => self.parse_series,
            Section::Coefficients => self.parse_coefficients,
            Section::Metadata => self.parse_metadata,
        }
    }

    fn flag_mut(&mut self, section: Section) -> &mut bool {
        match section {
            Section::ElevationalSamples => &mut self.parse_elevational_samples,
            Section::ParameterSampleCounts => &mut self.parse_parameter_sample_counts,
            Section::ParameterValues => &mut self.parse_parameter_values,
            Section::Cdf => &mut self.parse_cdf,
            Section::Series => &mut self.parse_series,
            Section::Coefficients => &mut self.parse_coefficients,
            Section::Metadata => &mut self.parse_metadata,
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Per-scalar consumer of a Fourier BSDF body.
///
/// Only [`start`](Self::start) is required. Every other callback defaults
/// to accepting and discarding its value, so a handler implements just the
/// sections it asked for.
///
/// Callbacks fire in wire order, once per element:
///
/// ```text
///   start(header) ─► ParseOptions
///   handle_elevational_sample    × N
///   handle_sample_count          × P
///   handle_sample_position       × V
///   handle_cdf                   × B·N·N
///   handle_series(offset, len)   × N·N
///   handle_coefficient           × C
///   handle_metadata(bytes)       × 1   (only when M > 0)
///   finish()
/// ```
///
/// Returning an error from any callback aborts the read with that error;
/// no later callback fires.
pub trait BsdfHandler {
    /// Inspect the header and choose which sections to materialise.
    ///
    /// # Errors
    ///
    /// Any error aborts the read before a body byte is consumed.
    fn start(&mut self, header: &BsdfHeader) -> Result<ParseOptions, DecodeError>;

    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_elevational_sample(&mut self, _value: f32) -> Result<(), DecodeError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_sample_count(&mut self, _count: u32) -> Result<(), DecodeError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_sample_position(&mut self, _value: f32) -> Result<(), DecodeError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_cdf(&mut self, _value: f32) -> Result<(), DecodeError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_series(&mut self, _offset: u32, _length: u32) -> Result<(), DecodeError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_coefficient(&mut self, _value: f32) -> Result<(), DecodeError> {
        Ok(())
    }

    /// Receives the whole metadata blob at once.
    ///
    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_metadata(&mut self, _data: Vec<u8>) -> Result<(), DecodeError> {
        Ok(())
    }

    /// Called once after every section was consumed; its result is the
    /// result of the read.
    ///
    /// # Errors
    ///
    /// Any error becomes the result of the read.
    fn finish(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }
}

impl<H: BsdfHandler + ?Sized> BsdfHandler for &mut H {
    fn start(&mut self, header: &BsdfHeader) -> Result<ParseOptions, DecodeError> {
        (**self).start(header)
    }

    fn handle_elevational_sample(&mut self, value: f32) -> Result<(), DecodeError> {
        (**self).handle_elevational_sample(value)
    }

    fn handle_sample_count(&mut self, count: u32) -> Result<(), DecodeError> {
        (**self).handle_sample_count(count)
    }

    fn handle_sample_position(&mut self, value: f32) -> Result<(), DecodeError> {
        (**self).handle_sample_position(value)
    }

    fn handle_cdf(&mut self, value: f32) -> Result<(), DecodeError> {
        (**self).handle_cdf(value)
    }

    fn handle_series(&mut self, offset: u32, length: u32) -> Result<(), DecodeError> {
        (**self).handle_series(offset, length)
    }

    fn handle_coefficient(&mut self, value: f32) -> Result<(), DecodeError> {
        (**self).handle_coefficient(value)
    }

    fn handle_metadata(&mut self, data: Vec<u8>) -> Result<(), DecodeError> {
        (**self).handle_metadata(data)
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        (**self).finish()
    }
}

/// Streaming decoder for Fourier BSDF files.
///
/// Reads the header, hands it to the handler, then walks the seven body
/// sections in wire order, either decoding each element into a callback or
/// skipping the section's bytes.
///
/// Usage:
///
/// ```rust,ignore
/// let mut handler = MyHandler::default();
/// BsdfReader::read(File::open(path)?, &mut handler)?;
/// ```
pub struct BsdfReader;

impl BsdfReader {
    /// Decode the header and drive the whole body through `handler`.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidHeader`] if the header fails validation or
    ///   the input ends inside it.
    /// - [`DecodeError::Wire`] if a section size overflows or the body is
    ///   truncated.
    /// - [`DecodeError::NonFinite`] for NaN or infinity in a materialised
    ///   float section.
    /// - Whatever the handler returns.
    pub fn read<R: Read, H: BsdfHandler + ?Sized>(
        input: R,
        handler: &mut H,
    ) -> Result<(), DecodeError> {
        let mut reader = ScalarReader::new(input);
        let header = BsdfHeader::decode(&mut reader).map_err(DecodeError::InvalidHeader)?;
        Self::drive(&mut reader, &header, handler)
    }

    /// Drive only the body, for callers that decoded the header
    /// themselves. `input` must be positioned just past the header.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read), minus header errors.
    pub fn read_body<R: Read, H: BsdfHandler + ?Sized>(
        input: R,
        header: &BsdfHeader,
        handler: &mut H,
    ) -> Result<(), DecodeError> {
        let mut reader = ScalarReader::with_position(input, HEADER_SIZE as u64);
        Self::drive(&mut reader, header, handler)
    }

    fn drive<R: Read, H: BsdfHandler + ?Sized>(
        reader: &mut ScalarReader<R>,
        header: &BsdfHeader,
        handler: &mut H,
    ) -> Result<(), DecodeError> {
        let options = handler.start(header)?;

        // Every section size must be representable before the first body
        // byte is touched.
        body_len(header)?;

        for section in Section::ALL {
            if options.parses(section) {
                Self::parse_section(reader, header, section, handler)?;
            } else {
                reader.skip(section.byte_len(header)?)?;
            }
        }

        handler.finish()
    }

    fn parse_section<R: Read, H: BsdfHandler + ?Sized>(
        reader: &mut ScalarReader<R>,
        header: &BsdfHeader,
        section: Section,
        handler: &mut H,
    ) -> Result<(), DecodeError> {
        let count = section.element_count(header)?;
        match section {
            Section::ElevationalSamples => {
                for _ in 0..count {
                    handler.handle_elevational_sample(read_finite(reader, section)?)?;
                }
            }
            Section::ParameterSampleCounts => {
                for _ in 0..count {
                    handler.handle_sample_count(reader.read_u32()?)?;
                }
            }
            Section::ParameterValues => {
                for _ in 0..count {
                    handler.handle_sample_position(read_finite(reader, section)?)?;
                }
            }
            Section::Cdf => {
                for _ in 0..count {
                    handler.handle_cdf(read_finite(reader, section)?)?;
                }
            }
            Section::Series => {
                for _ in 0..count {
                    let offset = reader.read_u32()?;
                    let length = reader.read_u32()?;
                    handler.handle_series(offset, length)?;
                }
            }
            Section::Coefficients => {
                for _ in 0..count {
                    handler.handle_coefficient(read_finite(reader, section)?)?;
                }
            }
            Section::Metadata => {
                if count != 0 {
                    handler.handle_metadata(reader.read_bytes(count)?)?;
                }
            }
        }
        Ok(())
    }
}

fn read_finite<R: Read>(
    reader: &mut ScalarReader<R>,
    section: Section,
) -> Result<f32, DecodeError> {
    let offset = reader.position();
    let value = reader.read_f32()?;
    if !value.is_finite() {
        return Err(DecodeError::NonFinite { section, offset });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use fbsdf_tests::writer::{
        RawHeader, make_empty_bsdf_file, make_minimal_bsdf_file, make_non_finite_bsdf_file,
    };
    use fbsdf_wire::WireError;

    use super::*;

    /// Records every callback as a line of text.
    #[derive(Default)]
    struct Recorder {
        options: Option<ParseOptions>,
        events: Vec<String>,
        fail_on: Option<&'static str>,
    }

    impl Recorder {
        fn parsing(options: ParseOptions) -> Self {
            Self {
                options: Some(options),
                ..Self::default()
            }
        }

        fn failing_on(event: &'static str) -> Self {
            Self {
                fail_on: Some(event),
                ..Self::default()
            }
        }

        fn record(&mut self, name: &'static str, detail: String) -> Result<(), DecodeError> {
            self.events.push(format!("{name}({detail})"));
            if self.fail_on == Some(name) {
                return Err(DecodeError::rejected(name));
            }
            Ok(())
        }
    }

    impl BsdfHandler for Recorder {
        fn start(&mut self, _header: &BsdfHeader) -> Result<ParseOptions, DecodeError> {
            self.record("start", String::new())?;
            Ok(self.options.unwrap_or_default())
        }

        fn handle_elevational_sample(&mut self, value: f32) -> Result<(), DecodeError> {
            self.record("sample", value.to_string())
        }

        fn handle_sample_count(&mut self, count: u32) -> Result<(), DecodeError> {
            self.record("count", count.to_string())
        }

        fn handle_sample_position(&mut self, value: f32) -> Result<(), DecodeError> {
            self.record("position", value.to_string())
        }

        fn handle_cdf(&mut self, value: f32) -> Result<(), DecodeError> {
            self.record("cdf", value.to_string())
        }

        fn handle_series(&mut self, offset: u32, length: u32) -> Result<(), DecodeError> {
            self.record("series", format!("{offset}, {length}"))
        }

        fn handle_coefficient(&mut self, value: f32) -> Result<(), DecodeError> {
            self.record("coefficient", value.to_string())
        }

        fn handle_metadata(&mut self, data: Vec<u8>) -> Result<(), DecodeError> {
            self.record("metadata", String::from_utf8_lossy(&data).into_owned())
        }

        fn finish(&mut self) -> Result<(), DecodeError> {
            self.record("finish", String::new())
        }
    }

    #[test]
    fn minimal_file_fires_every_callback_in_order() {
        let bytes = make_minimal_bsdf_file(1.0, 1.0, 1.0);
        let mut recorder = Recorder::default();
        BsdfReader::read(bytes.as_slice(), &mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            [
                "start()",
                "sample(1)",
                "count(1)",
                "position(1)",
                "cdf(0)",
                "series(0, 1)",
                "coefficient(1)",
                "metadata(meta)",
                "finish()",
            ]
        );
    }

    #[test]
    fn empty_file_only_starts_and_finishes() {
        let bytes = make_empty_bsdf_file(1.0, 1.0, 1.0);
        let mut recorder = Recorder::default();
        BsdfReader::read(bytes.as_slice(), &mut recorder).unwrap();
        assert_eq!(recorder.events, ["start()", "finish()"]);
    }

    #[test]
    fn skipped_sections_fire_nothing() {
        let bytes = make_minimal_bsdf_file(1.0, 1.0, 1.0);
        let mut recorder = Recorder::parsing(ParseOptions::only(Section::Series));
        BsdfReader::read(bytes.as_slice(), &mut recorder).unwrap();
        assert_eq!(recorder.events, ["start()", "series(0, 1)", "finish()"]);
    }

    #[test]
    fn handler_error_stops_the_read() {
        for event in [
            "start",
            "sample",
            "count",
            "position",
            "cdf",
            "series",
            "coefficient",
            "metadata",
            "finish",
        ] {
            let bytes = make_minimal_bsdf_file(1.0, 1.0, 1.0);
            let mut recorder = Recorder::failing_on(event);
            let err = BsdfReader::read(bytes.as_slice(), &mut recorder).unwrap_err();
            assert!(matches!(&err, DecodeError::Rejected(m) if m == event), "{event}: {err}");
            let last = recorder.events.last().unwrap();
            assert!(last.starts_with(event), "{event}: callbacks continued to {last}");
        }
    }

    #[test]
    fn non_finite_values_are_rejected_where_materialised() {
        let bytes = make_non_finite_bsdf_file(1.0, 1.0, 1.0);
        let err = BsdfReader::read(bytes.as_slice(), &mut Recorder::default()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::NonFinite {
                section: Section::ElevationalSamples,
                offset: 64
            }
        ));

        // Skipping every float section never interprets the NaNs.
        let options = ParseOptions::none()
            .with(Section::ParameterSampleCounts, true)
            .with(Section::Series, true)
            .with(Section::Metadata, true);
        BsdfReader::read(bytes.as_slice(), &mut Recorder::parsing(options)).unwrap();
    }

    #[test]
    fn truncated_body_is_eof() {
        let bytes = make_minimal_bsdf_file(1.0, 1.0, 1.0);
        let truncated = &bytes[..bytes.len() - 1];
        for options in [ParseOptions::all(), ParseOptions::none()] {
            let err = BsdfReader::read(truncated, &mut Recorder::parsing(options)).unwrap_err();
            assert!(err.is_unexpected_eof(), "{err}");
        }
    }

    #[test]
    fn read_body_after_separate_header_decode() {
        let bytes = make_minimal_bsdf_file(1.0, 1.0, 1.0);
        let mut input = bytes.as_slice();
        let header = BsdfHeader::read_from(&mut input).unwrap();
        let mut recorder = Recorder::parsing(ParseOptions::only(Section::Metadata));
        BsdfReader::read_body(input, &header, &mut recorder).unwrap();
        assert_eq!(recorder.events, ["start()", "metadata(meta)", "finish()"]);
    }

    #[test]
    fn overflowing_section_is_rejected_before_the_body() {
        let raw = RawHeader {
            num_elevational_samples: u32::MAX,
            num_basis_functions: u32::MAX,
            ..RawHeader::new()
        };
        let mut recorder = Recorder::parsing(ParseOptions::none());
        // No body bytes at all: the error must come from the size check,
        // not from running out of input.
        let err = BsdfReader::read(raw.to_bytes().as_slice(), &mut recorder).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Wire(WireError::TooLarge {
                section: Section::Cdf
            })
        ));
        assert_eq!(recorder.events, ["start()"]);
    }

    #[test]
    fn parse_options_builders() {
        assert_eq!(ParseOptions::default(), ParseOptions::all());
        let only = ParseOptions::only(Section::Cdf);
        for section in Section::ALL {
            assert_eq!(only.parses(section), section == Section::Cdf);
            assert!(!ParseOptions::none().parses(section));
        }
        assert!(!ParseOptions::all().with(Section::Metadata, false).parse_metadata);
    }
}
