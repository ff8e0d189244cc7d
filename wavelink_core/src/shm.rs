//! Named shared memory segments holding one batch record
//!
//! A [`SharedMemory`] handle moves through
//! `Unattached → Created | Attached → Detached | Closed`. The handle that
//! created a segment removes it when dropped; a handle that only attached
//! unmaps its own view and leaves the segment to the others.
//!
//! No locking is provided. Peers coordinate through the header's
//! `connected` counter and their own polling.
//!
//! ```rust,no_run
//! use wavelink_core::{SharedHeader, SharedMemory};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Display side
//! let mut display = SharedMemory::<SharedHeader>::create_record("demo", 2, 0, true)?;
//!
//! // Producer side
//! let mut producer = SharedMemory::<SharedHeader>::attach_record("demo", 2, 0)?;
//! producer.get_mut()?.connect();
//! # Ok(())
//! # }
//! ```

use crate::error::{LinkError, LinkResult};
use crate::platform::{self, OpenMode};
use crate::record::{RecordLayout, RecordView, RecordViewMut, checked_record_size};
use memmap2::MmapMut;
use nix::errno::Errno;
use std::marker::PhantomData;

/// Lifecycle state of a [`SharedMemory`] handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    /// Nothing mapped yet
    Unattached,
    /// Segment created and mapped by this handle
    Created,
    /// Existing segment mapped by this handle
    Attached,
    /// View unmapped, segment left in place
    Detached,
    /// Segment unmapped and removed
    Closed,
}

/// Handle on one named segment interpreted as a record with header `H`.
pub struct SharedMemory<H: RecordLayout> {
    name: String,
    size: usize,
    map: Option<MmapMut>,
    state: SegmentState,
    _layout: PhantomData<H>,
}

/// Turn a user segment name into the POSIX object name (`/name`).
fn os_segment_name(name: &str) -> LinkResult<String> {
    let bare = name.strip_prefix('/').unwrap_or(name);
    if bare.is_empty() {
        return Err(LinkError::invalid("segment name cannot be empty"));
    }
    if bare.contains('/') {
        return Err(LinkError::invalid(format!(
            "segment name {:?} cannot contain '/' after the first character",
            name
        )));
    }
    Ok(format!("/{}", bare))
}

impl<H: RecordLayout> Default for SharedMemory<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: RecordLayout> SharedMemory<H> {
    /// Unattached handle.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            size: 0,
            map: None,
            state: SegmentState::Unattached,
            _layout: PhantomData,
        }
    }

    /// Create, zero-fill and map a segment of exactly `size` bytes.
    ///
    /// An existing segment of the same name is replaced (and zeroed) when
    /// `allow_overwrite` is set; otherwise the call fails with
    /// `AlreadyExists`.
    pub fn create_new(&mut self, name: &str, size: usize, allow_overwrite: bool) -> LinkResult<()> {
        if size == 0 {
            return Err(LinkError::invalid("segment size must be positive"));
        }
        let os_name = os_segment_name(name)?;
        self.ensure_unmapped()?;

        let (file, created) = match platform::open_segment(&os_name, OpenMode::CreateExclusive) {
            Ok(file) => (file, true),
            Err(Errno::EEXIST) if allow_overwrite => {
                tracing::warn!("segment {} already exists, overwriting", os_name);
                (platform::open_segment(&os_name, OpenMode::Existing)?, false)
            }
            Err(Errno::EEXIST) => {
                return Err(LinkError::AlreadyExists {
                    name: os_name.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mapped = platform::resize_segment(&file, size)
            .and_then(|()| platform::map_segment(&file, size));
        let mut map = match mapped {
            Ok(map) => map,
            Err(e) => {
                if created {
                    let _ = platform::unlink_segment(&os_name);
                }
                return Err(e.into());
            }
        };
        map.fill(0);

        tracing::info!("created segment {} ({} bytes)", os_name, size);
        self.name = os_name;
        self.size = size;
        self.map = Some(map);
        self.state = SegmentState::Created;
        Ok(())
    }

    /// Map an existing segment whose size must be exactly `size` bytes.
    pub fn attach(&mut self, name: &str, size: usize) -> LinkResult<()> {
        if size == 0 {
            return Err(LinkError::invalid("segment size must be positive"));
        }
        let os_name = os_segment_name(name)?;
        self.ensure_unmapped()?;

        let file = match platform::open_segment(&os_name, OpenMode::Existing) {
            Ok(file) => file,
            Err(Errno::ENOENT) => return Err(LinkError::NotFound { name: os_name }),
            Err(e) => return Err(e.into()),
        };
        let actual = platform::segment_len(&file)?;
        if actual != size {
            return Err(LinkError::SizeMismatch {
                name: os_name,
                expected: size,
                actual,
            });
        }
        let map = platform::map_segment(&file, size)?;

        tracing::info!("attached segment {} ({} bytes)", os_name, size);
        self.name = os_name;
        self.size = size;
        self.map = Some(map);
        self.state = SegmentState::Attached;
        Ok(())
    }

    /// Create a segment sized for `num_control + num_wave` parameters and
    /// store the counts in its header.
    pub fn create_record(
        name: &str,
        num_control: usize,
        num_wave: usize,
        allow_overwrite: bool,
    ) -> LinkResult<Self> {
        let size = checked_record_size::<H>(num_control, num_wave)?;
        if num_control + num_wave == 0 {
            return Err(LinkError::invalid(format!(
                "{} needs at least one parameter",
                H::NAME
            )));
        }
        let mut shm = Self::new();
        shm.create_new(name, size, allow_overwrite)?;
        shm.get_mut()?.set_counts(num_control, num_wave)?;
        Ok(shm)
    }

    /// Attach to a segment sized for `num_control + num_wave` parameters.
    pub fn attach_record(name: &str, num_control: usize, num_wave: usize) -> LinkResult<Self> {
        let size = checked_record_size::<H>(num_control, num_wave)?;
        let mut shm = Self::new();
        shm.attach(name, size)?;
        {
            let view = shm.get()?;
            let header = view.header();
            if header.control_count() != num_control || header.wave_count() != num_wave {
                tracing::warn!(
                    "segment {} header counts ({}, {}) differ from expected ({}, {})",
                    shm.name,
                    header.control_count(),
                    header.wave_count(),
                    num_control,
                    num_wave
                );
            }
        }
        Ok(shm)
    }

    /// Typed read-only view of the mapped record.
    pub fn get(&self) -> LinkResult<RecordView<'_, H>> {
        let map = self.map.as_ref().ok_or(LinkError::NotAttached)?;
        RecordView::from_bytes(&map[..])
    }

    /// Typed mutable view of the mapped record.
    pub fn get_mut(&mut self) -> LinkResult<RecordViewMut<'_, H>> {
        let map = self.map.as_mut().ok_or(LinkError::NotAttached)?;
        RecordViewMut::from_bytes(&mut map[..])
    }

    /// Raw bytes of the mapped region.
    pub fn as_bytes(&self) -> LinkResult<&[u8]> {
        self.map.as_deref().ok_or(LinkError::NotAttached)
    }

    /// Unmap this process's view; the segment stays available to others.
    pub fn detach(&mut self) -> LinkResult<()> {
        let map = self.map.take().ok_or(LinkError::NotAttached)?;
        drop(map);
        self.state = SegmentState::Detached;
        tracing::info!("detached segment {}", self.name);
        Ok(())
    }

    /// Unmap and remove the segment so no process can attach again.
    pub fn close_new(&mut self) -> LinkResult<()> {
        let map = self.map.take().ok_or(LinkError::NotAttached)?;
        drop(map);
        self.state = SegmentState::Closed;
        match platform::unlink_segment(&self.name) {
            Ok(()) => tracing::info!("closed segment {}", self.name),
            Err(Errno::ENOENT) => {
                tracing::warn!("segment {} was already removed", self.name)
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// OS object name (`/name`), empty before the first create/attach.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mapped size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SegmentState {
        self.state
    }

    /// Whether a region is mapped.
    pub fn is_mapped(&self) -> bool {
        self.map.is_some()
    }

    fn ensure_unmapped(&self) -> LinkResult<()> {
        if self.map.is_some() {
            return Err(LinkError::invalid(format!(
                "handle already maps segment {}",
                self.name
            )));
        }
        Ok(())
    }
}

impl<H: RecordLayout> Drop for SharedMemory<H> {
    fn drop(&mut self) {
        if self.map.is_none() {
            return;
        }
        let result = match self.state {
            SegmentState::Created => self.close_new(),
            _ => self.detach(),
        };
        if let Err(e) = result {
            tracing::warn!("releasing segment {} failed: {}", self.name, e);
        }
    }
}
