//! Page header codec.
//!
//! The header is read and written as an explicit field-by-field codec over
//! a byte slice rather than a `#[repr(C)]` struct overlay, so field access
//! never depends on the host's struct layout or padding rules.

use byteorder::{ByteOrder, NativeEndian};

use crate::endian::swap_words;
use crate::error::RasterError;

/// Byte length of the V1 header record.
pub const V1_SIZE: usize = 420;
/// Byte length of the V2 header record (the V1 record plus the extension).
pub const V2_SIZE: usize = 1796;

/// Start of the 81-word scalar region that gets byte-swapped on a
/// byte-swapped stream.
const SWAP_START: usize = 256;
/// End of the swap region (start of `cupsString`/vendor string fields,
/// which are never swapped).
const SWAP_END: usize = 580;

/// `cupsColorOrder` values.
pub mod color_order {
    pub const CHUNKED: u32 = 0;
    pub const BANDED: u32 = 1;
    pub const PLANAR: u32 = 2;
}

/// Plane geometry and byte point-size of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size2D<T> {
    pub width: T,
    pub height: T,
}

/// Bounding box in four edges, generic over the scalar type (the V1
/// header stores this as integers, the V2 extension repeats it in points).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox<T> {
    pub left: T,
    pub bottom: T,
    pub right: T,
    pub top: T,
}

/// The V1-sized prefix of the page header, present on every stream
/// regardless of revision.
#[derive(Debug, Clone, PartialEq)]
pub struct PageHeaderV1 {
    pub media_class: String,
    pub media_color: String,
    pub media_type: String,
    pub output_type: String,
    pub advance_distance: u32,
    pub advance_media: u32,
    pub collate: bool,
    pub cut_media: u32,
    pub duplex: bool,
    pub hw_resolution: Size2D<u32>,
    pub imaging_bbox: BoundingBox<u32>,
    pub insert_sheet: bool,
    pub jog: u32,
    pub leading_edge: u32,
    pub margins: Size2D<u32>,
    pub manual_feed: bool,
    pub media_position: u32,
    pub media_weight: u32,
    pub mirror_print: bool,
    pub negative_print: bool,
    pub num_copies: u32,
    pub orientation: u32,
    pub output_face_up: bool,
    pub page_size: Size2D<u32>,
    pub separations: bool,
    pub tray_switch: bool,
    pub tumble: bool,
    pub width: u32,
    pub height: u32,
    pub cups_media_type: u32,
    pub bits_per_color: u32,
    pub bits_per_pixel: u32,
    pub bytes_per_line: u32,
    pub color_order: u32,
    pub color_space: u32,
    pub cups_compression: u32,
    pub cups_row_count: u32,
    pub cups_row_feed: u32,
    pub cups_row_step: u32,
}

impl Default for PageHeaderV1 {
    fn default() -> Self {
        Self {
            media_class: String::new(),
            media_color: String::new(),
            media_type: String::new(),
            output_type: String::new(),
            advance_distance: 0,
            advance_media: 0,
            collate: false,
            cut_media: 0,
            duplex: false,
            hw_resolution: Size2D::default(),
            imaging_bbox: BoundingBox::default(),
            insert_sheet: false,
            jog: 0,
            leading_edge: 0,
            margins: Size2D::default(),
            manual_feed: false,
            media_position: 0,
            media_weight: 0,
            mirror_print: false,
            negative_print: false,
            num_copies: 0,
            orientation: 0,
            output_face_up: false,
            page_size: Size2D::default(),
            separations: false,
            tray_switch: false,
            tumble: false,
            width: 0,
            height: 0,
            cups_media_type: 0,
            bits_per_color: 0,
            bits_per_pixel: 0,
            bytes_per_line: 0,
            color_order: color_order::CHUNKED,
            color_space: 0,
            cups_compression: 0,
            cups_row_count: 0,
            cups_row_feed: 0,
            cups_row_step: 0,
        }
    }
}

/// The full V2 header: the V1 prefix plus the V2 extension fields
/// (vendor data, marker type, rendering intent, page size name).
#[derive(Debug, Clone, PartialEq)]
pub struct PageHeaderV2 {
    pub v1: PageHeaderV1,
    pub num_colors: u32,
    pub borderless_scaling_factor: f32,
    pub page_size_pts: Size2D<f32>,
    pub imaging_bbox_pts: BoundingBox<f32>,
    pub vendor_integer: [u32; 16],
    pub vendor_real: [f32; 16],
    pub vendor_string: [String; 16],
    pub marker_type: String,
    pub rendering_intent: String,
    pub page_size_name: String,
}

impl Default for PageHeaderV2 {
    fn default() -> Self {
        Self {
            v1: PageHeaderV1::default(),
            num_colors: 0,
            borderless_scaling_factor: 0.0,
            page_size_pts: Size2D::default(),
            imaging_bbox_pts: BoundingBox::default(),
            vendor_integer: [0; 16],
            vendor_real: [0.0; 16],
            vendor_string: std::array::from_fn(|_| String::new()),
            marker_type: String::new(),
            rendering_intent: String::new(),
            page_size_name: String::new(),
        }
    }
}

fn read_c_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

fn write_c_string(dest: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(dest.len());
    dest[..len].copy_from_slice(&bytes[..len]);
    dest[len..].fill(0);
}

fn read_bool(word: u32) -> bool {
    word != 0
}

/// Apply the word-swap to the 81-word scalar region only, leaving string
/// fields (and, for V1-sized buffers, whatever lies past the V1 boundary)
/// untouched.
pub fn swap_scalar_region(buf: &mut [u8]) {
    let end = buf.len().min(SWAP_END);
    if end > SWAP_START {
        swap_words(&mut buf[SWAP_START..end]);
    }
}

fn decode_v1(buf: &[u8]) -> PageHeaderV1 {
    debug_assert!(buf.len() >= V1_SIZE);
    PageHeaderV1 {
        media_class: read_c_string(&buf[0..64]),
        media_color: read_c_string(&buf[64..128]),
        media_type: read_c_string(&buf[128..192]),
        output_type: read_c_string(&buf[192..256]),
        advance_distance: NativeEndian::read_u32(&buf[256..260]),
        advance_media: NativeEndian::read_u32(&buf[260..264]),
        collate: read_bool(NativeEndian::read_u32(&buf[264..268])),
        cut_media: NativeEndian::read_u32(&buf[268..272]),
        duplex: read_bool(NativeEndian::read_u32(&buf[272..276])),
        hw_resolution: Size2D {
            width: NativeEndian::read_u32(&buf[276..280]),
            height: NativeEndian::read_u32(&buf[280..284]),
        },
        imaging_bbox: BoundingBox {
            left: NativeEndian::read_u32(&buf[284..288]),
            bottom: NativeEndian::read_u32(&buf[288..292]),
            right: NativeEndian::read_u32(&buf[292..296]),
            top: NativeEndian::read_u32(&buf[296..300]),
        },
        insert_sheet: read_bool(NativeEndian::read_u32(&buf[300..304])),
        jog: NativeEndian::read_u32(&buf[304..308]),
        leading_edge: NativeEndian::read_u32(&buf[308..312]),
        margins: Size2D {
            width: NativeEndian::read_u32(&buf[312..316]),
            height: NativeEndian::read_u32(&buf[316..320]),
        },
        manual_feed: read_bool(NativeEndian::read_u32(&buf[320..324])),
        media_position: NativeEndian::read_u32(&buf[324..328]),
        media_weight: NativeEndian::read_u32(&buf[328..332]),
        mirror_print: read_bool(NativeEndian::read_u32(&buf[332..336])),
        negative_print: read_bool(NativeEndian::read_u32(&buf[336..340])),
        num_copies: NativeEndian::read_u32(&buf[340..344]),
        orientation: NativeEndian::read_u32(&buf[344..348]),
        output_face_up: read_bool(NativeEndian::read_u32(&buf[348..352])),
        page_size: Size2D {
            width: NativeEndian::read_u32(&buf[352..356]),
            height: NativeEndian::read_u32(&buf[356..360]),
        },
        separations: read_bool(NativeEndian::read_u32(&buf[360..364])),
        tray_switch: read_bool(NativeEndian::read_u32(&buf[364..368])),
        tumble: read_bool(NativeEndian::read_u32(&buf[368..372])),
        width: NativeEndian::read_u32(&buf[372..376]),
        height: NativeEndian::read_u32(&buf[376..380]),
        cups_media_type: NativeEndian::read_u32(&buf[380..384]),
        bits_per_color: NativeEndian::read_u32(&buf[384..388]),
        bits_per_pixel: NativeEndian::read_u32(&buf[388..392]),
        bytes_per_line: NativeEndian::read_u32(&buf[392..396]),
        color_order: NativeEndian::read_u32(&buf[396..400]),
        color_space: NativeEndian::read_u32(&buf[400..404]),
        cups_compression: NativeEndian::read_u32(&buf[404..408]),
        cups_row_count: NativeEndian::read_u32(&buf[408..412]),
        cups_row_feed: NativeEndian::read_u32(&buf[412..416]),
        cups_row_step: NativeEndian::read_u32(&buf[416..420]),
    }
}

fn encode_v1(dest: &mut [u8], h: &PageHeaderV1) {
    debug_assert!(dest.len() >= V1_SIZE);
    write_c_string(&mut dest[0..64], &h.media_class);
    write_c_string(&mut dest[64..128], &h.media_color);
    write_c_string(&mut dest[128..192], &h.media_type);
    write_c_string(&mut dest[192..256], &h.output_type);
    NativeEndian::write_u32(&mut dest[256..260], h.advance_distance);
    NativeEndian::write_u32(&mut dest[260..264], h.advance_media);
    NativeEndian::write_u32(&mut dest[264..268], h.collate as u32);
    NativeEndian::write_u32(&mut dest[268..272], h.cut_media);
    NativeEndian::write_u32(&mut dest[272..276], h.duplex as u32);
    NativeEndian::write_u32(&mut dest[276..280], h.hw_resolution.width);
    NativeEndian::write_u32(&mut dest[280..284], h.hw_resolution.height);
    NativeEndian::write_u32(&mut dest[284..288], h.imaging_bbox.left);
    NativeEndian::write_u32(&mut dest[288..292], h.imaging_bbox.bottom);
    NativeEndian::write_u32(&mut dest[292..296], h.imaging_bbox.right);
    NativeEndian::write_u32(&mut dest[296..300], h.imaging_bbox.top);
    NativeEndian::write_u32(&mut dest[300..304], h.insert_sheet as u32);
    NativeEndian::write_u32(&mut dest[304..308], h.jog);
    NativeEndian::write_u32(&mut dest[308..312], h.leading_edge);
    NativeEndian::write_u32(&mut dest[312..316], h.margins.width);
    NativeEndian::write_u32(&mut dest[316..320], h.margins.height);
    NativeEndian::write_u32(&mut dest[320..324], h.manual_feed as u32);
    NativeEndian::write_u32(&mut dest[324..328], h.media_position);
    NativeEndian::write_u32(&mut dest[328..332], h.media_weight);
    NativeEndian::write_u32(&mut dest[332..336], h.mirror_print as u32);
    NativeEndian::write_u32(&mut dest[336..340], h.negative_print as u32);
    NativeEndian::write_u32(&mut dest[340..344], h.num_copies);
    NativeEndian::write_u32(&mut dest[344..348], h.orientation);
    NativeEndian::write_u32(&mut dest[348..352], h.output_face_up as u32);
    NativeEndian::write_u32(&mut dest[352..356], h.page_size.width);
    NativeEndian::write_u32(&mut dest[356..360], h.page_size.height);
    NativeEndian::write_u32(&mut dest[360..364], h.separations as u32);
    NativeEndian::write_u32(&mut dest[364..368], h.tray_switch as u32);
    NativeEndian::write_u32(&mut dest[368..372], h.tumble as u32);
    NativeEndian::write_u32(&mut dest[372..376], h.width);
    NativeEndian::write_u32(&mut dest[376..380], h.height);
    NativeEndian::write_u32(&mut dest[380..384], h.cups_media_type);
    NativeEndian::write_u32(&mut dest[384..388], h.bits_per_color);
    NativeEndian::write_u32(&mut dest[388..392], h.bits_per_pixel);
    NativeEndian::write_u32(&mut dest[392..396], h.bytes_per_line);
    NativeEndian::write_u32(&mut dest[396..400], h.color_order);
    NativeEndian::write_u32(&mut dest[400..404], h.color_space);
    NativeEndian::write_u32(&mut dest[404..408], h.cups_compression);
    NativeEndian::write_u32(&mut dest[408..412], h.cups_row_count);
    NativeEndian::write_u32(&mut dest[412..416], h.cups_row_feed);
    NativeEndian::write_u32(&mut dest[416..420], h.cups_row_step);
}

fn decode_v2_extension(buf: &[u8]) -> (
    u32,
    f32,
    Size2D<f32>,
    BoundingBox<f32>,
    [u32; 16],
    [f32; 16],
    [String; 16],
    String,
    String,
    String,
) {
    debug_assert!(buf.len() >= V2_SIZE - V1_SIZE);
    let num_colors = NativeEndian::read_u32(&buf[0..4]);
    let borderless_scaling_factor = NativeEndian::read_f32(&buf[4..8]);
    let page_size_pts = Size2D {
        width: NativeEndian::read_f32(&buf[8..12]),
        height: NativeEndian::read_f32(&buf[12..16]),
    };
    let imaging_bbox_pts = BoundingBox {
        left: NativeEndian::read_f32(&buf[16..20]),
        bottom: NativeEndian::read_f32(&buf[20..24]),
        right: NativeEndian::read_f32(&buf[24..28]),
        top: NativeEndian::read_f32(&buf[28..32]),
    };
    let mut vendor_integer = [0u32; 16];
    for (i, slot) in vendor_integer.iter_mut().enumerate() {
        *slot = NativeEndian::read_u32(&buf[32 + i * 4..36 + i * 4]);
    }
    let mut vendor_real = [0f32; 16];
    for (i, slot) in vendor_real.iter_mut().enumerate() {
        *slot = NativeEndian::read_f32(&buf[96 + i * 4..100 + i * 4]);
    }
    let vendor_string: [String; 16] = std::array::from_fn(|i| {
        read_c_string(&buf[160 + i * 64..224 + i * 64])
    });
    let marker_type = read_c_string(&buf[1184..1248]);
    let rendering_intent = read_c_string(&buf[1248..1312]);
    let page_size_name = read_c_string(&buf[1312..1376]);
    (
        num_colors,
        borderless_scaling_factor,
        page_size_pts,
        imaging_bbox_pts,
        vendor_integer,
        vendor_real,
        vendor_string,
        marker_type,
        rendering_intent,
        page_size_name,
    )
}

fn encode_v2_extension(dest: &mut [u8], h: &PageHeaderV2) {
    debug_assert!(dest.len() >= V2_SIZE - V1_SIZE);
    NativeEndian::write_u32(&mut dest[0..4], h.num_colors);
    NativeEndian::write_f32(&mut dest[4..8], h.borderless_scaling_factor);
    NativeEndian::write_f32(&mut dest[8..12], h.page_size_pts.width);
    NativeEndian::write_f32(&mut dest[12..16], h.page_size_pts.height);
    NativeEndian::write_f32(&mut dest[16..20], h.imaging_bbox_pts.left);
    NativeEndian::write_f32(&mut dest[20..24], h.imaging_bbox_pts.bottom);
    NativeEndian::write_f32(&mut dest[24..28], h.imaging_bbox_pts.right);
    NativeEndian::write_f32(&mut dest[28..32], h.imaging_bbox_pts.top);
    for (i, v) in h.vendor_integer.iter().enumerate() {
        NativeEndian::write_u32(&mut dest[32 + i * 4..36 + i * 4], *v);
    }
    for (i, v) in h.vendor_real.iter().enumerate() {
        NativeEndian::write_f32(&mut dest[96 + i * 4..100 + i * 4], *v);
    }
    for (i, s) in h.vendor_string.iter().enumerate() {
        write_c_string(&mut dest[160 + i * 64..224 + i * 64], s);
    }
    write_c_string(&mut dest[1184..1248], &h.marker_type);
    write_c_string(&mut dest[1248..1312], &h.rendering_intent);
    write_c_string(&mut dest[1312..1376], &h.page_size_name);
}

/// Decode a header record already swapped into native order (see
/// [`swap_scalar_region`]). `buf` must be [`V1_SIZE`] or [`V2_SIZE`] bytes.
pub fn decode(buf: &[u8]) -> PageHeaderV2 {
    let v1 = decode_v1(buf);
    if buf.len() >= V2_SIZE {
        let (
            num_colors,
            borderless_scaling_factor,
            page_size_pts,
            imaging_bbox_pts,
            vendor_integer,
            vendor_real,
            vendor_string,
            marker_type,
            rendering_intent,
            page_size_name,
        ) = decode_v2_extension(&buf[V1_SIZE..V2_SIZE]);
        PageHeaderV2 {
            v1,
            num_colors,
            borderless_scaling_factor,
            page_size_pts,
            imaging_bbox_pts,
            vendor_integer,
            vendor_real,
            vendor_string,
            marker_type,
            rendering_intent,
            page_size_name,
        }
    } else {
        PageHeaderV2 {
            v1,
            ..PageHeaderV2::default()
        }
    }
}

/// Encode the full V2-sized header record, native byte order, no swap —
/// the writer always emits the full V2 record regardless of which
/// revision the caller gave it.
pub fn encode(h: &PageHeaderV2) -> [u8; V2_SIZE] {
    let mut buf = [0u8; V2_SIZE];
    encode_v1(&mut buf[0..V1_SIZE], &h.v1);
    encode_v2_extension(&mut buf[V1_SIZE..V2_SIZE], h);
    buf
}

/// `cupsColorSpace` codes and the plane count they imply.
fn plane_count_for_color_space(color_space: u32, bits_per_pixel: u32) -> Option<u32> {
    match color_space {
        // 1 plane
        18 | 3 | 21 | 22 | 23 => Some(1),
        // 3 planes
        19 | 4 | 5 | 38 | 39 | 43..=58 => Some(3),
        // 4 planes
        20 | 16 | 6 | 7 | 8 | 33 | 34 => Some(4),
        // KCMYcm
        32 => Some(if bits_per_pixel < 8 { 6 } else { 4 }),
        _ => None,
    }
}

/// Derive `cupsNumColors` from `cupsColorSpace`.
///
/// V1 headers (or a V2 header that arrived with `num_colors == 0`) always
/// get the derived value; a V2 header with a nonzero value already set is
/// preserved.
pub fn derive_num_colors(color_space: u32, bits_per_pixel: u32, is_v1: bool, existing: u32) -> u32 {
    if !is_v1 && existing != 0 {
        return existing;
    }
    plane_count_for_color_space(color_space, bits_per_pixel).unwrap_or(existing)
}

/// Derive `bpp`, the byte width of one pixel element or color plane.
pub fn derive_bpp(color_order: u32, bits_per_pixel: u32, bits_per_color: u32) -> u32 {
    if color_order == color_order::CHUNKED {
        bits_per_pixel.div_ceil(8)
    } else {
        bits_per_color.div_ceil(8)
    }
}

/// Derive `remaining`, the number of rows pending on this page.
pub fn derive_remaining(color_order: u32, height: u32, num_colors: u32) -> u64 {
    if color_order == color_order::PLANAR {
        height as u64 * num_colors as u64
    } else {
        height as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_v1() -> PageHeaderV1 {
        PageHeaderV1 {
            media_class: "test".into(),
            width: 8,
            height: 4,
            bits_per_color: 8,
            bits_per_pixel: 32,
            bytes_per_line: 32,
            color_order: color_order::CHUNKED,
            color_space: 6, // CMYK
            ..PageHeaderV1::default()
        }
    }

    #[test]
    fn v1_round_trips_through_encode_decode() {
        let v1 = sample_v1();
        let h = PageHeaderV2 {
            v1: v1.clone(),
            ..PageHeaderV2::default()
        };
        let bytes = encode(&h);
        let decoded = decode(&bytes[..V1_SIZE]);
        assert_eq!(decoded.v1, v1);
    }

    #[test]
    fn v2_extension_round_trips() {
        let mut h = PageHeaderV2 {
            v1: sample_v1(),
            num_colors: 4,
            marker_type: "ink".into(),
            page_size_name: "iso_a4_210x297mm".into(),
            ..PageHeaderV2::default()
        };
        h.vendor_integer[3] = 42;
        h.vendor_real[0] = 1.5;
        h.vendor_string[5] = "hello".into();
        let bytes = encode(&h);
        let decoded = decode(&bytes);
        assert_eq!(decoded, h);
    }

    #[test]
    fn word_swap_over_narrow_width_field_decodes_correctly() {
        // Raw cupsWidth bytes 00 00 00 08, word-swapped, decodes to 8.
        let mut buf = [0u8; V1_SIZE];
        buf[372..376].copy_from_slice(&[0x00, 0x00, 0x00, 0x08]);
        swap_scalar_region(&mut buf);
        let h = decode(&buf);
        assert_eq!(h.v1.width, 8);
    }

    #[test]
    fn derive_num_colors_cmyk_is_four_planes() {
        assert_eq!(derive_num_colors(6, 32, true, 0), 4);
    }

    #[test]
    fn derive_num_colors_kcmycm_depends_on_bits_per_pixel() {
        assert_eq!(derive_num_colors(32, 4, true, 0), 6);
        assert_eq!(derive_num_colors(32, 8, true, 0), 4);
    }

    #[test]
    fn derive_num_colors_v2_nonzero_preserved() {
        assert_eq!(derive_num_colors(6, 32, false, 9), 9);
    }

    #[test]
    fn derive_num_colors_unknown_color_space_unchanged() {
        assert_eq!(derive_num_colors(9999, 32, true, 7), 7);
    }

    #[test]
    fn derive_bpp_chunked_rounds_up() {
        assert_eq!(derive_bpp(color_order::CHUNKED, 25, 8), 4);
    }

    #[test]
    fn derive_bpp_planar_uses_bits_per_color() {
        assert_eq!(derive_bpp(color_order::PLANAR, 32, 10), 2);
    }

    #[test]
    fn derive_remaining_planar_multiplies_by_colors() {
        assert_eq!(derive_remaining(color_order::PLANAR, 100, 4), 400);
        assert_eq!(derive_remaining(color_order::CHUNKED, 100, 4), 100);
    }

    #[test]
    fn write_v1_header_then_read_derives_cmyk_num_colors() {
        let v1 = PageHeaderV1 {
            color_space: 6, // CMYK
            color_order: color_order::CHUNKED,
            bits_per_pixel: 32,
            ..PageHeaderV1::default()
        };
        let h = PageHeaderV2 {
            v1,
            num_colors: 0,
            ..PageHeaderV2::default()
        };
        let bytes = encode(&h);
        let mut reread = decode(&bytes[..V1_SIZE]);
        reread.num_colors = derive_num_colors(
            reread.v1.color_space,
            reread.v1.bits_per_pixel,
            true,
            reread.num_colors,
        );
        let bpp = derive_bpp(
            reread.v1.color_order,
            reread.v1.bits_per_pixel,
            reread.v1.bits_per_color,
        );
        assert_eq!(reread.num_colors, 4);
        assert_eq!(bpp, 4);
    }
}
