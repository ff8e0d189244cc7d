//! Batch record layouts
//!
//! A batch record is a fixed header followed by a trailing array of
//! [`Parameter`]s whose length is recorded in the header. Three headers are
//! defined:
//!
//! | Layout | Header fields | Header size | Used for |
//! |--------|---------------|-------------|----------|
//! | [`SharedHeader`] | connected, control count, wave count, gamepad | 88 | shared-memory segments |
//! | [`FromDisplayHeader`] | control count, gamepad | 72 | socket, display → producer |
//! | [`ToDisplayHeader`] | wave count | 8 | socket, producer → display |
//!
//! Record memory is never addressed past the header by pointer arithmetic.
//! [`RecordView`] and [`RecordViewMut`] split a byte region into a typed
//! header and a parameter slice sized to the region's capacity, and every
//! parameter access is range-checked against the count stored in the header.
//! [`BatchRecord`] owns an 8-byte aligned buffer of exactly
//! `size_of::<H>() + count * 48` bytes.

use crate::collection::ParameterCollection;
use crate::error::{LinkError, LinkResult};
use crate::gamepad::GamepadCommand;
use crate::parameter::Parameter;
use bytemuck::{Pod, Zeroable};
use static_assertions::{const_assert, const_assert_eq};
use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use wavelink::consts::{PARAMETER_SIZE, RECORD_ALIGN};

/// A header type that can front a batch record.
pub trait RecordLayout: Pod {
    /// Layout name used in errors and logs
    const NAME: &'static str;

    /// Control parameters recorded in the header.
    fn control_count(&self) -> usize;

    /// Waveform parameters recorded in the header.
    fn wave_count(&self) -> usize;

    /// Store both counts.
    ///
    /// Fails with `InvalidArgument` if the layout has no field for a
    /// non-zero count.
    fn write_counts(&mut self, control: usize, wave: usize) -> LinkResult<()>;

    /// Split a total parameter count into (control, wave) for this layout.
    fn split_total(total: usize) -> (usize, usize);

    /// Gamepad block, if the layout carries one.
    fn gamepad(&self) -> Option<&GamepadCommand> {
        None
    }

    /// Mutable gamepad block, if the layout carries one.
    fn gamepad_mut(&mut self) -> Option<&mut GamepadCommand> {
        None
    }

    /// Total parameters following the header.
    fn param_count(&self) -> usize {
        self.control_count().saturating_add(self.wave_count())
    }
}

/// Exact byte size of a record with `count` parameters, `None` if it does
/// not fit in `usize`.
pub const fn record_size<H: RecordLayout>(count: usize) -> Option<usize> {
    match count.checked_mul(PARAMETER_SIZE) {
        Some(tail) => size_of::<H>().checked_add(tail),
        None => None,
    }
}

/// [`record_size`] of `num_control + num_wave` parameters, or
/// `InvalidArgument` when the size overflows.
pub fn checked_record_size<H: RecordLayout>(num_control: usize, num_wave: usize) -> LinkResult<usize> {
    num_control
        .checked_add(num_wave)
        .and_then(record_size::<H>)
        .ok_or_else(|| {
            LinkError::invalid(format!(
                "{} with {} control + {} wave parameters is too large",
                H::NAME,
                num_control,
                num_wave
            ))
        })
}

/// Number of parameters a region of `len` bytes holds, if `len` is a
/// header plus a whole number of parameters.
pub fn param_capacity<H: RecordLayout>(len: usize) -> Option<usize> {
    let tail = len.checked_sub(size_of::<H>())?;
    (tail % PARAMETER_SIZE == 0).then_some(tail / PARAMETER_SIZE)
}

fn count_from_raw(raw: u64) -> usize {
    usize::try_from(raw).unwrap_or(usize::MAX)
}

fn count_to_raw(count: usize) -> u64 {
    count as u64
}

/// Header of a shared-memory record.
///
/// Indices `[0, num_control_params)` of the trailing array are control
/// parameters, `[num_control_params, num_control_params + num_wave_params)`
/// are waveform parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SharedHeader {
    /// Number of attached peers, updated without synchronization
    pub connected: i32,
    _pad: [u8; 4],
    num_control_params: u64,
    num_wave_params: u64,
    /// Gamepad state
    pub gamepad: GamepadCommand,
}

/// Header of a socket record sent by the display.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FromDisplayHeader {
    num_control_params: u64,
    /// Gamepad state
    pub gamepad: GamepadCommand,
}

/// Header of a socket record sent to the display.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ToDisplayHeader {
    num_wave_params: u64,
}

const_assert_eq!(size_of::<SharedHeader>(), 88);
const_assert_eq!(size_of::<FromDisplayHeader>(), 72);
const_assert_eq!(size_of::<ToDisplayHeader>(), 8);
const_assert!(align_of::<SharedHeader>() <= RECORD_ALIGN);
const_assert!(align_of::<FromDisplayHeader>() <= RECORD_ALIGN);
const_assert!(align_of::<ToDisplayHeader>() <= RECORD_ALIGN);
const_assert!(align_of::<Parameter>() <= RECORD_ALIGN);

impl RecordLayout for SharedHeader {
    const NAME: &'static str = "SharedParameters";

    fn control_count(&self) -> usize {
        count_from_raw(self.num_control_params)
    }

    fn wave_count(&self) -> usize {
        count_from_raw(self.num_wave_params)
    }

    fn write_counts(&mut self, control: usize, wave: usize) -> LinkResult<()> {
        self.num_control_params = count_to_raw(control);
        self.num_wave_params = count_to_raw(wave);
        Ok(())
    }

    fn split_total(total: usize) -> (usize, usize) {
        (total, 0)
    }

    fn gamepad(&self) -> Option<&GamepadCommand> {
        Some(&self.gamepad)
    }

    fn gamepad_mut(&mut self) -> Option<&mut GamepadCommand> {
        Some(&mut self.gamepad)
    }
}

impl RecordLayout for FromDisplayHeader {
    const NAME: &'static str = "SocketFromDisplay";

    fn control_count(&self) -> usize {
        count_from_raw(self.num_control_params)
    }

    fn wave_count(&self) -> usize {
        0
    }

    fn write_counts(&mut self, control: usize, wave: usize) -> LinkResult<()> {
        if wave != 0 {
            return Err(LinkError::invalid(format!(
                "{} carries no waveform parameters, got {}",
                Self::NAME,
                wave
            )));
        }
        self.num_control_params = count_to_raw(control);
        Ok(())
    }

    fn split_total(total: usize) -> (usize, usize) {
        (total, 0)
    }

    fn gamepad(&self) -> Option<&GamepadCommand> {
        Some(&self.gamepad)
    }

    fn gamepad_mut(&mut self) -> Option<&mut GamepadCommand> {
        Some(&mut self.gamepad)
    }
}

impl RecordLayout for ToDisplayHeader {
    const NAME: &'static str = "SocketToDisplay";

    fn control_count(&self) -> usize {
        0
    }

    fn wave_count(&self) -> usize {
        count_from_raw(self.num_wave_params)
    }

    fn write_counts(&mut self, control: usize, wave: usize) -> LinkResult<()> {
        if control != 0 {
            return Err(LinkError::invalid(format!(
                "{} carries no control parameters, got {}",
                Self::NAME,
                control
            )));
        }
        self.num_wave_params = count_to_raw(wave);
        Ok(())
    }

    fn split_total(total: usize) -> (usize, usize) {
        (0, total)
    }
}

/// Owned shared-memory layout record.
pub type SharedParameters = BatchRecord<SharedHeader>;
/// Owned display → producer socket record.
pub type SocketFromDisplay = BatchRecord<FromDisplayHeader>;
/// Owned producer → display socket record.
pub type SocketToDisplay = BatchRecord<ToDisplayHeader>;

fn split_region<H: RecordLayout>(len: usize) -> LinkResult<usize> {
    param_capacity::<H>(len).ok_or_else(|| {
        LinkError::invalid(format!(
            "{} region of {} bytes is not a {}-byte header plus whole {}-byte parameters",
            H::NAME,
            len,
            size_of::<H>(),
            PARAMETER_SIZE
        ))
    })
}

fn check_count<H: RecordLayout>(header: &H, capacity: usize) -> LinkResult<()> {
    let count = header.param_count();
    if count > capacity {
        return Err(LinkError::SizeMismatch {
            name: H::NAME.to_string(),
            expected: record_size::<H>(capacity).unwrap_or(usize::MAX),
            actual: size_of::<H>().saturating_add(count.saturating_mul(PARAMETER_SIZE)),
        });
    }
    Ok(())
}

fn cast_error(what: &str, e: bytemuck::PodCastError) -> LinkError {
    LinkError::invalid(format!("{} is not usable as record memory: {:?}", what, e))
}

/// Read-only typed view over record memory.
pub struct RecordView<'a, H: RecordLayout> {
    header: &'a H,
    params: &'a [Parameter],
}

impl<'a, H: RecordLayout> RecordView<'a, H> {
    /// Interpret `bytes` as a record.
    ///
    /// `bytes` must be 8-byte aligned, hold exactly a header plus whole
    /// parameters, and the header's counts must fit in that capacity.
    pub fn from_bytes(bytes: &'a [u8]) -> LinkResult<Self> {
        let capacity = split_region::<H>(bytes.len())?;
        let (head, tail) = bytes.split_at(size_of::<H>());
        let header: &H = bytemuck::try_from_bytes(head).map_err(|e| cast_error(H::NAME, e))?;
        let params: &[Parameter] =
            bytemuck::try_cast_slice(tail).map_err(|e| cast_error("parameter array", e))?;
        debug_assert_eq!(params.len(), capacity);
        check_count(header, capacity)?;
        Ok(Self { header, params })
    }

    /// Header fields.
    pub fn header(&self) -> &'a H {
        self.header
    }

    /// Parameter slots available in the underlying region.
    pub fn capacity(&self) -> usize {
        self.params.len()
    }

    /// Gamepad block, if the layout carries one.
    pub fn gamepad(&self) -> Option<&'a GamepadCommand> {
        self.header.gamepad()
    }

    /// Parameters counted by the header.
    pub fn parameters(&self) -> &'a [Parameter] {
        &self.params[..self.header.param_count()]
    }

    /// Parameter `index`, range-checked against the header count.
    pub fn parameter(&self, index: usize) -> LinkResult<&'a Parameter> {
        let params = self.parameters();
        params.get(index).ok_or(LinkError::IndexOutOfRange {
            index,
            len: params.len(),
        })
    }

    /// Control parameters, `[0, control_count)`.
    pub fn control_parameters(&self) -> &'a [Parameter] {
        &self.params[..self.header.control_count()]
    }

    /// Waveform parameters, `[control_count, control_count + wave_count)`.
    pub fn wave_parameters(&self) -> &'a [Parameter] {
        &self.params[self.header.control_count()..self.header.param_count()]
    }
}

impl<'a> RecordView<'a, SharedHeader> {
    /// Number of attached peers.
    pub fn connected(&self) -> i32 {
        self.header.connected
    }
}

/// Mutable typed view over record memory.
pub struct RecordViewMut<'a, H: RecordLayout> {
    header: &'a mut H,
    params: &'a mut [Parameter],
}

impl<'a, H: RecordLayout> RecordViewMut<'a, H> {
    /// Interpret `bytes` as a mutable record, with the same checks as
    /// [`RecordView::from_bytes`].
    pub fn from_bytes(bytes: &'a mut [u8]) -> LinkResult<Self> {
        let capacity = split_region::<H>(bytes.len())?;
        let (head, tail) = bytes.split_at_mut(size_of::<H>());
        let header: &mut H =
            bytemuck::try_from_bytes_mut(head).map_err(|e| cast_error(H::NAME, e))?;
        let params: &mut [Parameter] =
            bytemuck::try_cast_slice_mut(tail).map_err(|e| cast_error("parameter array", e))?;
        debug_assert_eq!(params.len(), capacity);
        check_count(header, capacity)?;
        Ok(Self { header, params })
    }

    /// Reborrow as a read-only view.
    pub fn as_view(&self) -> RecordView<'_, H> {
        RecordView {
            header: &*self.header,
            params: &*self.params,
        }
    }

    /// Header fields.
    pub fn header(&self) -> &H {
        &*self.header
    }

    /// Parameter slots available in the underlying region.
    pub fn capacity(&self) -> usize {
        self.params.len()
    }

    /// Split the record's slots between control and waveform parameters.
    ///
    /// `control + wave` must equal the capacity; changing the total needs a
    /// new allocation ([`BatchRecord::resized`]).
    pub fn set_counts(&mut self, control: usize, wave: usize) -> LinkResult<()> {
        let total = control
            .checked_add(wave)
            .filter(|total| *total == self.params.len())
            .ok_or_else(|| {
                LinkError::invalid(format!(
                    "{} control + {} wave parameters do not fill capacity {}",
                    control,
                    wave,
                    self.params.len()
                ))
            })?;
        self.header.write_counts(control, wave)?;
        debug_assert_eq!(self.header.param_count(), total);
        Ok(())
    }

    /// Gamepad block, if the layout carries one.
    pub fn gamepad(&self) -> Option<&GamepadCommand> {
        self.header.gamepad()
    }

    /// Mutable gamepad block, if the layout carries one.
    pub fn gamepad_mut(&mut self) -> Option<&mut GamepadCommand> {
        self.header.gamepad_mut()
    }

    /// Parameters counted by the header.
    pub fn parameters(&self) -> &[Parameter] {
        &self.params[..self.header.param_count()]
    }

    /// Mutable parameters counted by the header.
    pub fn parameters_mut(&mut self) -> &mut [Parameter] {
        let count = self.header.param_count();
        &mut self.params[..count]
    }

    /// Parameter `index`, range-checked against the header count.
    pub fn parameter(&self, index: usize) -> LinkResult<&Parameter> {
        let params = self.parameters();
        params.get(index).ok_or(LinkError::IndexOutOfRange {
            index,
            len: params.len(),
        })
    }

    /// Mutable parameter `index`, range-checked against the header count.
    pub fn parameter_mut(&mut self, index: usize) -> LinkResult<&mut Parameter> {
        let params = self.parameters_mut();
        let len = params.len();
        params
            .get_mut(index)
            .ok_or(LinkError::IndexOutOfRange { index, len })
    }

    /// Control parameters, `[0, control_count)`.
    pub fn control_parameters(&self) -> &[Parameter] {
        &self.params[..self.header.control_count()]
    }

    /// Mutable control parameters.
    pub fn control_parameters_mut(&mut self) -> &mut [Parameter] {
        let control = self.header.control_count();
        &mut self.params[..control]
    }

    /// Waveform parameters, `[control_count, control_count + wave_count)`.
    pub fn wave_parameters(&self) -> &[Parameter] {
        &self.params[self.header.control_count()..self.header.param_count()]
    }

    /// Mutable waveform parameters.
    pub fn wave_parameters_mut(&mut self) -> &mut [Parameter] {
        let (start, end) = (self.header.control_count(), self.header.param_count());
        &mut self.params[start..end]
    }

    /// Index every named parameter of the record by name.
    pub fn collect_parameters(&mut self, name: &str) -> ParameterCollection<'_> {
        ParameterCollection::from_slice(name, self.parameters_mut())
    }
}

impl<'a> RecordViewMut<'a, SharedHeader> {
    /// Number of attached peers.
    pub fn connected(&self) -> i32 {
        self.header.connected
    }

    /// Register one more attached peer.
    ///
    /// Plain read-modify-write on shared memory; concurrent callers race.
    pub fn connect(&mut self) -> i32 {
        self.header.connected = self.header.connected.wrapping_add(1);
        self.header.connected
    }

    /// Unregister an attached peer.
    pub fn disconnect(&mut self) -> i32 {
        self.header.connected = self.header.connected.wrapping_sub(1);
        self.header.connected
    }
}

/// Process-local batch record with its own aligned buffer.
#[derive(Clone)]
pub struct BatchRecord<H: RecordLayout> {
    words: Vec<u64>,
    _layout: PhantomData<H>,
}

impl<H: RecordLayout> BatchRecord<H> {
    /// Allocate a zeroed record and store its counts.
    ///
    /// Fails with `InvalidArgument` when both counts are zero or the layout
    /// has no field for a non-zero count.
    pub fn create(num_control: usize, num_wave: usize) -> LinkResult<Self> {
        let len = checked_record_size::<H>(num_control, num_wave)?;
        let total = num_control + num_wave;
        if total == 0 {
            return Err(LinkError::invalid(format!(
                "{} needs at least one parameter",
                H::NAME
            )));
        }
        let mut header = H::zeroed();
        header.write_counts(num_control, num_wave)?;

        let mut record = Self {
            words: vec![0u64; len / RECORD_ALIGN],
            _layout: PhantomData,
        };
        record.as_bytes_mut()[..size_of::<H>()].copy_from_slice(bytemuck::bytes_of(&header));
        tracing::debug!("allocated {} with {} parameters ({} bytes)", H::NAME, total, len);
        Ok(record)
    }

    /// Allocate a record of `count` parameters split the way the layout
    /// records them.
    pub fn with_params(count: usize) -> LinkResult<Self> {
        let (control, wave) = H::split_total(count);
        Self::create(control, wave)
    }

    /// New record with different counts.
    ///
    /// The header, the overlapping control parameters and the overlapping
    /// waveform parameters are copied; `self` is left untouched.
    pub fn resized(&self, num_control: usize, num_wave: usize) -> LinkResult<Self> {
        let mut next = Self::create(num_control, num_wave)?;
        let old = self.view()?;
        {
            let mut dst = next.view_mut()?;
            let header = *old.header();
            *dst.header = header;
            dst.header.write_counts(num_control, num_wave)?;

            let src_control = old.control_parameters();
            let n = src_control.len().min(num_control);
            dst.control_parameters_mut()[..n].copy_from_slice(&src_control[..n]);

            let src_wave = old.wave_parameters();
            let n = src_wave.len().min(num_wave);
            dst.wave_parameters_mut()[..n].copy_from_slice(&src_wave[..n]);
        }
        Ok(next)
    }

    /// Record byte length.
    pub fn len(&self) -> usize {
        self.words.len() * RECORD_ALIGN
    }

    /// Always false; records hold at least one parameter.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Exact byte image of the record.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    /// Mutable byte image of the record.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.words)
    }

    /// Overwrite the record with a received image of the same length.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> LinkResult<()> {
        if bytes.len() != self.len() {
            return Err(LinkError::SizeMismatch {
                name: H::NAME.to_string(),
                expected: self.len(),
                actual: bytes.len(),
            });
        }
        self.as_bytes_mut().copy_from_slice(bytes);
        Ok(())
    }

    /// Read-only view.
    pub fn view(&self) -> LinkResult<RecordView<'_, H>> {
        RecordView::from_bytes(self.as_bytes())
    }

    /// Mutable view.
    pub fn view_mut(&mut self) -> LinkResult<RecordViewMut<'_, H>> {
        RecordViewMut::from_bytes(self.as_bytes_mut())
    }
}

impl<H: RecordLayout + fmt::Debug> fmt::Debug for BatchRecord<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.view() {
            Ok(view) => f
                .debug_struct(H::NAME)
                .field("header", view.header())
                .field("parameters", &view.parameters())
                .finish(),
            Err(_) => f.debug_struct(H::NAME).field("len", &self.len()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterValue;
    use wavelink::kind::ParameterKind;

    #[test]
    fn test_record_sizes() {
        assert_eq!(record_size::<SharedHeader>(0), Some(88));
        assert_eq!(record_size::<SharedHeader>(2), Some(88 + 96));
        assert_eq!(record_size::<FromDisplayHeader>(1), Some(72 + 48));
        assert_eq!(record_size::<ToDisplayHeader>(3), Some(8 + 144));
        assert_eq!(record_size::<SharedHeader>(usize::MAX / 40), None);
        assert_eq!(record_size::<SharedHeader>(usize::MAX / 48), None);
        assert_eq!(param_capacity::<ToDisplayHeader>(8 + 144), Some(3));
        assert_eq!(param_capacity::<ToDisplayHeader>(8 + 143), None);
        assert_eq!(param_capacity::<SharedHeader>(40), None);
    }

    #[test]
    fn test_create_zero_params_rejected() {
        assert!(matches!(
            SharedParameters::create(0, 0),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            SocketFromDisplay::create(1, 1),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            SocketToDisplay::create(1, 0),
            Err(LinkError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_create_oversized_rejected() {
        assert!(matches!(
            SharedParameters::create(usize::MAX / 40, 0),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            SharedParameters::create(usize::MAX, 1),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            checked_record_size::<SharedHeader>(usize::MAX / 48, 0),
            Err(LinkError::InvalidArgument { .. })
        ));
        assert_eq!(checked_record_size::<SharedHeader>(1, 1).unwrap(), 88 + 96);
    }

    #[test]
    fn test_create_sets_counts_and_zeroes() {
        let record = SharedParameters::create(2, 3).unwrap();
        assert_eq!(record.len(), 88 + 5 * 48);
        let view = record.view().unwrap();
        assert_eq!(view.header().control_count(), 2);
        assert_eq!(view.header().wave_count(), 3);
        assert_eq!(view.connected(), 0);
        assert_eq!(view.control_parameters().len(), 2);
        assert_eq!(view.wave_parameters().len(), 3);
        assert!(view.parameters().iter().all(|p| !p.is_set() && !p.has_name()));
    }

    #[test]
    fn test_shared_slices_are_ordered() {
        let mut record = SharedParameters::create(1, 2).unwrap();
        let mut view = record.view_mut().unwrap();
        view.control_parameters_mut()[0].set_name("ctl");
        view.wave_parameters_mut()[1].set_name("w1");
        assert_eq!(view.parameter(0).unwrap().name(), "ctl");
        assert_eq!(view.parameter(2).unwrap().name(), "w1");
        assert!(matches!(
            view.parameter(3),
            Err(LinkError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_header_byte_image() {
        let mut record = SharedParameters::create(2, 5).unwrap();
        record.view_mut().unwrap().connect();
        let bytes = record.as_bytes();
        assert_eq!(i32::from_ne_bytes(bytes[0..4].try_into().unwrap()), 1);
        assert_eq!(u64::from_ne_bytes(bytes[8..16].try_into().unwrap()), 2);
        assert_eq!(u64::from_ne_bytes(bytes[16..24].try_into().unwrap()), 5);

        let to = SocketToDisplay::with_params(4).unwrap();
        assert_eq!(u64::from_ne_bytes(to.as_bytes()[0..8].try_into().unwrap()), 4);
    }

    #[test]
    fn test_set_counts_checked() {
        let mut record = SharedParameters::create(2, 2).unwrap();
        let mut view = record.view_mut().unwrap();
        assert!(view.set_counts(3, 2).is_err());
        assert!(view.set_counts(usize::MAX, 1).is_err());
        // shrinking the total would leave slots the header does not count
        assert!(view.set_counts(1, 0).is_err());
        assert!(view.set_counts(1, 1).is_err());
        assert_eq!(view.parameters().len(), 4);

        view.set_counts(1, 3).unwrap();
        assert_eq!(view.control_parameters().len(), 1);
        assert_eq!(view.capacity(), 4);
        view.set_counts(0, 4).unwrap();
        assert!(view.control_parameters().is_empty());
        assert_eq!(view.wave_parameters().len(), 4);
    }

    #[test]
    fn test_view_rejects_bad_regions() {
        let words = vec![0u64; 20];
        let bytes: &[u8] = bytemuck::cast_slice(&words);
        assert!(RecordView::<ToDisplayHeader>::from_bytes(&bytes[..8 + 48]).is_ok());
        assert!(RecordView::<ToDisplayHeader>::from_bytes(&bytes[..8 + 47]).is_err());
        assert!(RecordView::<ToDisplayHeader>::from_bytes(&bytes[..4]).is_err());
        // misaligned start
        assert!(RecordView::<ToDisplayHeader>::from_bytes(&bytes[1..1 + 8 + 48]).is_err());
    }

    #[test]
    fn test_view_rejects_count_beyond_capacity() {
        let mut words = vec![0u64; 1 + 6];
        words[0] = 2;
        let bytes: &[u8] = bytemuck::cast_slice(&words);
        assert!(matches!(
            RecordView::<ToDisplayHeader>::from_bytes(bytes),
            Err(LinkError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_resized_copies_across() {
        let mut record = SharedParameters::create(2, 1).unwrap();
        {
            let mut view = record.view_mut().unwrap();
            view.connect();
            view.parameter_mut(0).unwrap().set_value(1.0f32);
            view.parameter_mut(1).unwrap().set_value(2.0f64);
            view.parameter_mut(2).unwrap().set_value(3i64);
            view.gamepad_mut().unwrap().lt = 0.25;
        }

        let grown = record.resized(3, 2).unwrap();
        let view = grown.view().unwrap();
        assert_eq!(view.connected(), 1);
        assert_eq!(view.gamepad().unwrap().lt, 0.25);
        assert_eq!(view.parameter(0).unwrap().float().unwrap(), 1.0);
        assert_eq!(view.parameter(1).unwrap().double().unwrap(), 2.0);
        assert!(!view.parameter(2).unwrap().is_set());
        assert_eq!(view.parameter(3).unwrap().s64().unwrap(), 3);
        assert!(!view.parameter(4).unwrap().is_set());

        let shrunk = record.resized(1, 0).unwrap();
        assert_eq!(shrunk.len(), record_size::<SharedHeader>(1).unwrap());
        assert_eq!(shrunk.view().unwrap().parameters().len(), 1);
        assert_eq!(record.view().unwrap().parameters().len(), 3);
    }

    #[test]
    fn test_load_bytes_requires_same_length() {
        let mut a = SocketFromDisplay::with_params(1).unwrap();
        let mut b = SocketFromDisplay::with_params(1).unwrap();
        b.view_mut()
            .unwrap()
            .parameter_mut(0)
            .unwrap()
            .set_value(ParameterValue::from(9.0f32));
        a.load_bytes(b.as_bytes()).unwrap();
        assert_eq!(
            a.view().unwrap().parameter(0).unwrap().kind().unwrap(),
            ParameterKind::Float
        );
        assert!(a.load_bytes(&[0u8; 8]).is_err());
    }

    #[test]
    fn test_from_display_has_gamepad_to_display_not() {
        let mut from = SocketFromDisplay::with_params(1).unwrap();
        assert!(from.view_mut().unwrap().gamepad_mut().is_some());
        let to = SocketToDisplay::with_params(1).unwrap();
        assert!(to.view().unwrap().gamepad().is_none());
    }
}
