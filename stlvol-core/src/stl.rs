/// Binary STL reader and writer
///
/// Layout: an 80-byte header, a 4-byte facet count and then 50-byte facet
/// records. Every record field is little-endian. The count is written in the
/// byte order of the machine that produced the file, which for the files this
/// tool sees is the native order; [`CountByteOrder`] makes that explicit.
use nalgebra::{Point3, Vector3};
use nom::{
    number::{
        complete::{i32 as count_field, le_f32, le_i16},
        Endianness,
    },
    sequence::tuple,
    IResult,
};
use serde::Deserialize;
use std::io::{self, ErrorKind, Read, Write};
use std::str::FromStr;
use tracing::{debug, trace};

use crate::error::StlError;
use crate::geometry::{Facet, Mesh};

pub const HEADER_SIZE: usize = 80;
pub const COUNT_SIZE: usize = 4;
pub const FACET_SIZE: usize = 50;

/// Byte order of the facet count field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountByteOrder {
    #[default]
    Native,
    Little,
    Big,
}

impl CountByteOrder {
    fn endianness(self) -> Endianness {
        match self {
            CountByteOrder::Native => Endianness::Native,
            CountByteOrder::Little => Endianness::Little,
            CountByteOrder::Big => Endianness::Big,
        }
    }

    pub fn encode(self, count: i32) -> [u8; COUNT_SIZE] {
        match self {
            CountByteOrder::Native => count.to_ne_bytes(),
            CountByteOrder::Little => count.to_le_bytes(),
            CountByteOrder::Big => count.to_be_bytes(),
        }
    }
}

impl FromStr for CountByteOrder {
    type Err = StlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(CountByteOrder::Native),
            "little" | "le" => Ok(CountByteOrder::Little),
            "big" | "be" => Ok(CountByteOrder::Big),
            _ => Err(StlError::unknown("byte order", s)),
        }
    }
}

/// How the declared facet count bounds iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountPolicy {
    /// Read until the stream runs out, whatever the header claims
    #[default]
    Advisory,
    /// Also stop once the declared number of facets has been read
    Strict,
}

impl FromStr for CountPolicy {
    type Err = StlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "advisory" => Ok(CountPolicy::Advisory),
            "strict" => Ok(CountPolicy::Strict),
            _ => Err(StlError::unknown("count policy", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadOptions {
    pub count_byte_order: CountByteOrder,
    pub count_policy: CountPolicy,
}

/// Skip the 80-byte header, returning its raw bytes
pub fn open_header<R: Read>(stream: &mut R) -> Result<[u8; HEADER_SIZE], StlError> {
    let mut header = [0u8; HEADER_SIZE];
    stream
        .read_exact(&mut header)
        .map_err(|e| StlError::io("failed to read 80-byte STL header", e))?;
    Ok(header)
}

/// Read the facet count that follows the header
pub fn read_declared_count<R: Read>(stream: &mut R, order: CountByteOrder) -> Result<i32, StlError> {
    let mut bytes = [0u8; COUNT_SIZE];
    stream
        .read_exact(&mut bytes)
        .map_err(|e| StlError::io("failed to read STL facet count", e))?;

    let parsed: IResult<&[u8], i32> = count_field(order.endianness())(&bytes[..]);
    match parsed {
        Ok((_, count)) => Ok(count),
        // Four bytes are always enough for an i32
        Err(_) => Err(StlError::io(
            "failed to decode STL facet count",
            io::Error::from(ErrorKind::InvalidData),
        )),
    }
}

fn vector3(input: &[u8]) -> IResult<&[u8], Vector3<f32>> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

fn point3(input: &[u8]) -> IResult<&[u8], Point3<f32>> {
    let (input, v) = vector3(input)?;
    Ok((input, Point3::from(v)))
}

/// Decode one 50-byte facet record
pub fn parse_facet(input: &[u8]) -> IResult<&[u8], Facet> {
    let (input, normal) = vector3(input)?;
    let (input, p1) = point3(input)?;
    let (input, p2) = point3(input)?;
    let (input, p3) = point3(input)?;
    let (input, attribute) = le_i16(input)?;

    Ok((input, Facet::new(normal, p1, p2, p3).with_attribute(attribute)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    Ready,
    Exhausted,
}

/// Streaming decoder over a binary STL source.
///
/// Yields facets until the stream cannot supply another full record. A short
/// trailing record ends iteration quietly; any other I/O failure is yielded
/// once as an error and also ends iteration.
pub struct BinaryMeshReader<R> {
    inner: R,
    header: [u8; HEADER_SIZE],
    declared_count: i32,
    policy: CountPolicy,
    produced: usize,
    state: ReaderState,
}

impl<R: Read> BinaryMeshReader<R> {
    /// Consume the header and count, leaving the stream at the first facet
    pub fn open(mut inner: R, options: ReadOptions) -> Result<Self, StlError> {
        let header = open_header(&mut inner)?;
        let declared_count = read_declared_count(&mut inner, options.count_byte_order)?;
        debug!(
            declared_count,
            byte_order = ?options.count_byte_order,
            policy = ?options.count_policy,
            "opened binary STL"
        );

        Ok(Self {
            inner,
            header,
            declared_count,
            policy: options.count_policy,
            produced: 0,
            state: ReaderState::Ready,
        })
    }

    pub fn header(&self) -> &[u8; HEADER_SIZE] {
        &self.header
    }

    pub fn declared_count(&self) -> i32 {
        self.declared_count
    }

    /// Number of facets produced so far
    pub fn facets_read(&self) -> usize {
        self.produced
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == ReaderState::Exhausted
    }

    /// Read the next facet, or `Ok(None)` once the mesh is complete
    pub fn next_facet(&mut self) -> Result<Option<Facet>, StlError> {
        if self.state == ReaderState::Exhausted {
            return Ok(None);
        }

        if self.policy == CountPolicy::Strict
            && usize::try_from(self.declared_count).map_or(true, |n| self.produced >= n)
        {
            debug!(produced = self.produced, "declared facet count reached");
            self.state = ReaderState::Exhausted;
            return Ok(None);
        }

        let mut record = [0u8; FACET_SIZE];
        let filled = match fill(&mut self.inner, &mut record) {
            Ok(filled) => filled,
            Err(e) => {
                self.state = ReaderState::Exhausted;
                return Err(StlError::io(
                    format!("failed to read facet {}", self.produced),
                    e,
                ));
            }
        };

        if filled < FACET_SIZE {
            if filled > 0 {
                debug!(bytes = filled, "ignoring incomplete trailing facet record");
            }
            self.state = ReaderState::Exhausted;
            return Ok(None);
        }

        let facet = match parse_facet(&record) {
            Ok((_, facet)) => facet,
            // A full record always decodes
            Err(_) => {
                self.state = ReaderState::Exhausted;
                return Ok(None);
            }
        };

        trace!(index = self.produced, ?facet, "decoded facet");
        self.produced += 1;
        Ok(Some(facet))
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Iterator for BinaryMeshReader<R> {
    type Item = Result<Facet, StlError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_facet().transpose()
    }
}

impl<R: Read> std::iter::FusedIterator for BinaryMeshReader<R> {}

/// Fill `buf` as far as the stream allows. A short count means end of stream.
fn fill<R: Read>(stream: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Decode a whole mesh, returning it with the declared facet count
pub fn read_mesh<R: Read>(stream: R, options: ReadOptions) -> Result<(i32, Mesh), StlError> {
    let mut reader = BinaryMeshReader::open(stream, options)?;
    let declared = reader.declared_count();
    let mut mesh = Mesh::with_capacity(usize::try_from(declared).unwrap_or(0).min(1 << 20));

    while let Some(facet) = reader.next_facet()? {
        mesh.add_facet(facet);
    }

    Ok((declared, mesh))
}

/// Parse a binary STL held in memory
pub fn parse_binary_stl(data: &[u8], options: ReadOptions) -> Result<Mesh, StlError> {
    read_mesh(data, options).map(|(_, mesh)| mesh)
}

/// Append one 50-byte record for `facet`
pub fn encode_facet(facet: &Facet, buf: &mut Vec<u8>) {
    for component in facet.normal.iter() {
        buf.extend_from_slice(&component.to_le_bytes());
    }
    for vertex in &facet.vertices {
        for component in vertex.coords.iter() {
            buf.extend_from_slice(&component.to_le_bytes());
        }
    }
    buf.extend_from_slice(&facet.attribute.to_le_bytes());
}

/// Write a binary STL. The header is truncated or zero-padded to 80 bytes.
pub fn write_binary_stl<W: Write>(
    writer: &mut W,
    header: &[u8],
    declared_count: i32,
    facets: &[Facet],
    order: CountByteOrder,
) -> io::Result<()> {
    let mut padded = [0u8; HEADER_SIZE];
    let len = header.len().min(HEADER_SIZE);
    padded[..len].copy_from_slice(&header[..len]);
    writer.write_all(&padded)?;
    writer.write_all(&order.encode(declared_count))?;

    let mut record = Vec::with_capacity(FACET_SIZE);
    for facet in facets {
        record.clear();
        encode_facet(facet, &mut record);
        writer.write_all(&record)?;
    }
    Ok(())
}

/// Encode a mesh with a matching native-order count
pub fn encode_binary_stl(mesh: &Mesh, header: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + COUNT_SIZE + mesh.len() * FACET_SIZE);
    let count = i32::try_from(mesh.len()).unwrap_or(i32::MAX);
    // Writing to a Vec cannot fail
    let _ = write_binary_stl(&mut buf, header.as_bytes(), count, &mesh.facets, CountByteOrder::Native);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Facet {
        Facet::new(
            Vector3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
        .with_attribute(-3)
    }

    fn file_with(count: i32, order: CountByteOrder, facets: &[Facet]) -> Vec<u8> {
        let mut data = Vec::new();
        write_binary_stl(&mut data, b"test header", count, facets, order).unwrap();
        data
    }

    /// Fails with a non-EOF error after handing out `ok_bytes`
    struct FailingReader {
        data: Vec<u8>,
        pos: usize,
        ok_bytes: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.ok_bytes {
                return Err(io::Error::new(ErrorKind::Other, "disk on fire"));
            }
            let n = buf.len().min(self.ok_bytes - self.pos).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&0i32.to_ne_bytes());

        let result = parse_binary_stl(&data, ReadOptions::default());
        assert!(result.is_ok());
        let mesh = result.unwrap();
        assert_eq!(mesh.facets.len(), 0);
    }

    #[test]
    fn test_record_layout() {
        let data = file_with(1, CountByteOrder::Little, &[triangle()]);
        assert_eq!(data.len(), HEADER_SIZE + COUNT_SIZE + FACET_SIZE);
        assert_eq!(&data[..11], b"test header");
        assert!(data[11..80].iter().all(|&b| b == 0));
        assert_eq!(&data[80..84], &1i32.to_le_bytes());
        // normal z
        assert_eq!(&data[92..96], &1.0f32.to_le_bytes());
        // p2 x
        assert_eq!(&data[108..112], &1.0f32.to_le_bytes());
        assert_eq!(&data[132..134], &(-3i16).to_le_bytes());
    }

    #[test]
    fn test_round_trip_bit_identical() {
        let facets: Vec<Facet> = (0..5)
            .map(|i| {
                let f = i as f32;
                Facet::new(
                    Vector3::new(f32::MIN_POSITIVE, -0.0, 1.0 / 3.0),
                    Point3::new(f * 0.1, -f * 7.25, 1e-30),
                    Point3::new(f32::MAX, f + 0.5, -1e10),
                    Point3::new(std::f32::consts::PI, f, -f),
                )
                .with_attribute(i as i16)
            })
            .collect();
        let data = file_with(5, CountByteOrder::Native, &facets);

        let (declared, mesh) = read_mesh(&data[..], ReadOptions::default()).unwrap();
        assert_eq!(declared, 5);
        assert_eq!(mesh.len(), 5);
        for (decoded, original) in mesh.facets.iter().zip(&facets) {
            assert_eq!(decoded.attribute, original.attribute);
            let decoded_bits: Vec<u32> = decoded
                .vertices
                .iter()
                .flat_map(|p| p.coords.iter().map(|c| c.to_bits()).collect::<Vec<_>>())
                .collect();
            let original_bits: Vec<u32> = original
                .vertices
                .iter()
                .flat_map(|p| p.coords.iter().map(|c| c.to_bits()).collect::<Vec<_>>())
                .collect();
            assert_eq!(decoded_bits, original_bits);
            assert_eq!(decoded.normal.y.to_bits(), (-0.0f32).to_bits());
        }
    }

    #[test]
    fn test_count_byte_orders() {
        let count = 0x0102_0304;
        for order in [CountByteOrder::Native, CountByteOrder::Little, CountByteOrder::Big] {
            let data = file_with(count, order, &[]);
            let reader = BinaryMeshReader::open(
                &data[..],
                ReadOptions {
                    count_byte_order: order,
                    ..Default::default()
                },
            )
            .unwrap();
            assert_eq!(reader.declared_count(), count, "order {:?}", order);
        }

        // Reading a big-endian count as little-endian gives the swapped value
        let data = file_with(count, CountByteOrder::Big, &[]);
        let reader = BinaryMeshReader::open(
            &data[..],
            ReadOptions {
                count_byte_order: CountByteOrder::Little,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(reader.declared_count(), 0x0403_0201);
    }

    #[test]
    fn test_native_matches_platform() {
        let expected = if cfg!(target_endian = "little") {
            CountByteOrder::Little
        } else {
            CountByteOrder::Big
        };
        assert_eq!(CountByteOrder::Native.encode(12345), expected.encode(12345));
    }

    #[test]
    fn test_short_header_is_io_error() {
        let data = vec![0u8; 79];
        let err = BinaryMeshReader::open(&data[..], ReadOptions::default()).err().unwrap();
        assert!(err.is_unexpected_eof());
        assert!(err.to_string().contains("80-byte"));
    }

    #[test]
    fn test_missing_count_is_io_error() {
        let data = vec![0u8; 82];
        let err = BinaryMeshReader::open(&data[..], ReadOptions::default()).err().unwrap();
        assert!(err.is_unexpected_eof());
        assert!(err.to_string().contains("facet count"));
    }

    #[test]
    fn test_truncated_record_ends_iteration() {
        let facets = [triangle(), triangle().reversed()];
        let full = file_with(2, CountByteOrder::Native, &facets);
        let truncated = &full[..full.len() - 4];

        let mut reader = BinaryMeshReader::open(truncated, ReadOptions::default()).unwrap();
        assert_eq!(reader.next_facet().unwrap(), Some(facets[0]));
        assert_eq!(reader.next_facet().unwrap(), None);
        assert!(reader.is_exhausted());
        assert_eq!(reader.next_facet().unwrap(), None);
        assert_eq!(reader.facets_read(), 1);
    }

    #[test]
    fn test_advisory_count_reads_past_declared() {
        let facets = [triangle(), triangle(), triangle()];
        let data = file_with(1, CountByteOrder::Native, &facets);
        let decoded: Vec<_> = BinaryMeshReader::open(&data[..], ReadOptions::default())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(decoded.len(), 3);
    }

    #[test]
    fn test_advisory_count_reads_short_of_declared() {
        let data = file_with(10, CountByteOrder::Native, &[triangle()]);
        let (declared, mesh) = read_mesh(&data[..], ReadOptions::default()).unwrap();
        assert_eq!(declared, 10);
        assert_eq!(mesh.len(), 1);
    }

    #[test]
    fn test_strict_count_stops_at_declared() {
        let facets = [triangle(), triangle(), triangle()];
        let strict = ReadOptions {
            count_policy: CountPolicy::Strict,
            ..Default::default()
        };

        let data = file_with(2, CountByteOrder::Native, &facets);
        let (_, mesh) = read_mesh(&data[..], strict).unwrap();
        assert_eq!(mesh.len(), 2);

        let data = file_with(-1, CountByteOrder::Native, &facets);
        let (declared, mesh) = read_mesh(&data[..], strict).unwrap();
        assert_eq!(declared, -1);
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_io_error_mid_stream_is_surfaced() {
        let data = file_with(2, CountByteOrder::Native, &[triangle(), triangle()]);
        let failing = FailingReader {
            data,
            pos: 0,
            ok_bytes: HEADER_SIZE + COUNT_SIZE + FACET_SIZE + 10,
        };

        let mut reader = BinaryMeshReader::open(failing, ReadOptions::default()).unwrap();
        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert!(!err.is_unexpected_eof());
        assert!(err.to_string().contains("facet 1"));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_parse_option_strings() {
        assert_eq!("big".parse::<CountByteOrder>().unwrap(), CountByteOrder::Big);
        assert_eq!("le".parse::<CountByteOrder>().unwrap(), CountByteOrder::Little);
        assert_eq!("strict".parse::<CountPolicy>().unwrap(), CountPolicy::Strict);
        assert!("middle".parse::<CountByteOrder>().is_err());
    }
}
