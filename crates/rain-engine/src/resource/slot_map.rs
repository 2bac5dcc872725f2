//! Generation-checked storage behind the opaque handles scripts hold.
//!
//! Handle bit layout (64 bits):
//! `kind:8 | generation:24 | index + 1:32`
//!
//! The `+ 1` keeps every valid handle non-zero, so 0 can cross the boundary
//! as "no handle". The kind tag rejects a texture handle passed where a render
//! pass is expected; the generation rejects a handle whose slot was freed.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::num::NonZeroU64;

use thiserror::Error;

const INDEX_BITS: u32 = 32;
const GEN_BITS: u32 = 24;
const GEN_MASK: u32 = (1 << GEN_BITS) - 1;
const KIND_SHIFT: u32 = INDEX_BITS + GEN_BITS;

/// Resource kind encoded in the top byte of a handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandleKind {
    Texture = 1,
    RenderPass = 2,
    Window = 3,
}

impl HandleKind {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Texture),
            2 => Some(Self::RenderPass),
            3 => Some(Self::Window),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("null handle")]
    Null,
    #[error("expected a {expected:?} handle, got tag {found}")]
    WrongKind { expected: HandleKind, found: u8 },
    #[error("stale {kind:?} handle (slot {index}, generation {generation})")]
    Stale {
        kind: HandleKind,
        index: u32,
        generation: u32,
    },
}

/// Untyped handle as it crosses the scripting boundary.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct RawHandle(NonZeroU64);

impl RawHandle {
    pub fn new(kind: HandleKind, generation: u32, index: u32) -> Self {
        debug_assert!(index < u32::MAX, "slot index out of range");
        let bits = (u64::from(kind as u8) << KIND_SHIFT)
            | (u64::from(generation & GEN_MASK) << INDEX_BITS)
            | u64::from(index.wrapping_add(1));
        // The kind tag is never zero.
        Self(NonZeroU64::new(bits).unwrap_or(NonZeroU64::MIN))
    }

    pub fn from_bits(bits: u64) -> Option<Self> {
        NonZeroU64::new(bits).map(Self)
    }

    #[inline]
    pub fn to_bits(self) -> u64 {
        self.0.get()
    }

    #[inline]
    pub fn tag(self) -> u8 {
        (self.0.get() >> KIND_SHIFT) as u8
    }

    pub fn kind(self) -> Option<HandleKind> {
        HandleKind::from_tag(self.tag())
    }

    #[inline]
    pub fn generation(self) -> u32 {
        ((self.0.get() >> INDEX_BITS) as u32) & GEN_MASK
    }

    /// Slot index, or `None` when the low word is zero (never produced by `new`).
    #[inline]
    pub fn index(self) -> Option<u32> {
        (self.0.get() as u32).checked_sub(1)
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawHandle({:#018x})", self.to_bits())
    }
}

/// Objects stored in a `SlotMap`.
pub trait Resource {
    const KIND: HandleKind;
}

/// Typed handle into a `SlotMap<T>`.
pub struct Handle<T> {
    raw: RawHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn from_raw(raw: RawHandle) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn raw(self) -> RawHandle {
        self.raw
    }

    #[inline]
    pub fn to_bits(self) -> u64 {
        self.raw.to_bits()
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("tag", &self.raw.tag())
            .field("index", &self.raw.index())
            .field("generation", &self.raw.generation())
            .finish()
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage with generation-checked handles.
///
/// Freed slots are reused; each reuse bumps the slot generation so handles to
/// the previous occupant stop resolving. A slot whose generation is exhausted
/// is retired instead of reused.
pub struct SlotMap<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T: Resource> SlotMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, value: T) -> Handle<T> {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle::from_raw(RawHandle::new(T::KIND, slot.generation, index));
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Handle::from_raw(RawHandle::new(T::KIND, 0, index))
    }

    /// Checks a raw value from the boundary and types it.
    pub fn resolve(&self, bits: u64) -> Result<Handle<T>, HandleError> {
        let raw = RawHandle::from_bits(bits).ok_or(HandleError::Null)?;
        if raw.kind() != Some(T::KIND) {
            return Err(HandleError::WrongKind {
                expected: T::KIND,
                found: raw.tag(),
            });
        }
        let handle = Handle::from_raw(raw);
        self.slot_index(handle)?;
        Ok(handle)
    }

    fn slot_index(&self, handle: Handle<T>) -> Result<usize, HandleError> {
        let raw = handle.raw;
        let stale = || HandleError::Stale {
            kind: T::KIND,
            index: raw.index().unwrap_or(u32::MAX),
            generation: raw.generation(),
        };
        let index = raw.index().ok_or_else(&stale)? as usize;
        match self.slots.get(index) {
            Some(slot) if slot.generation == raw.generation() && slot.value.is_some() => Ok(index),
            _ => Err(stale()),
        }
    }

    pub fn get(&self, handle: Handle<T>) -> Result<&T, HandleError> {
        let index = self.slot_index(handle)?;
        self.slots[index].value.as_ref().ok_or(HandleError::Null)
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut T, HandleError> {
        let index = self.slot_index(handle)?;
        self.slots[index].value.as_mut().ok_or(HandleError::Null)
    }

    /// Frees the slot and returns its value. The handle is invalid afterwards.
    pub fn remove(&mut self, handle: Handle<T>) -> Result<T, HandleError> {
        let index = self.slot_index(handle)?;
        let slot = &mut self.slots[index];
        let value = slot.value.take().ok_or(HandleError::Null)?;
        self.len -= 1;
        if slot.generation < GEN_MASK {
            slot.generation += 1;
            self.free.push(index as u32);
        }
        Ok(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let value = slot.value.as_ref()?;
            let raw = RawHandle::new(T::KIND, slot.generation, index as u32);
            Some((Handle::from_raw(raw), value))
        })
    }
}
