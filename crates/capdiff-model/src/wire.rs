//! Word-level access to segmented Cap'n Proto messages.
//!
//! Pointer-typed constant and default values keep their encoded form, and
//! the value comparator reads words straight out of the segments instead of
//! decoding into heap structures. This module implements the segment-table
//! framing and the struct/list/far pointer encodings needed for that, plus
//! the small typed accessors (`get_u32`, byte reads) the rest of the
//! workspace uses.

use thiserror::Error;

/// Errors raised while reading a segmented message.
#[derive(Debug, Error)]
pub enum WireError {
    /// The byte stream ended before the segment table said it would.
    #[error("message truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// The segment table itself is malformed.
    #[error("invalid segment table: {reason}")]
    InvalidSegmentTable { reason: String },

    /// A pointer referenced a segment the message does not have.
    #[error("segment {segment} out of range")]
    SegmentOutOfRange { segment: u32 },

    /// A pointer or its target landed outside its segment.
    #[error("word {word} out of bounds in segment {segment}")]
    OutOfBounds { segment: u32, word: u32 },

    /// A far pointer chain did not land on a usable pointer.
    #[error("malformed far pointer at segment {segment} word {word}")]
    BadFarPointer { segment: u32, word: u32 },

    /// A composite list's tag word is not struct-shaped or disagrees with
    /// the list pointer's word count.
    #[error("malformed composite list tag at segment {segment} word {word}")]
    BadListTag { segment: u32, word: u32 },
}

/// Hard cap on far-pointer hops; real messages need at most two.
const MAX_FAR_HOPS: u8 = 8;

/// Sanity cap on the segment count of a single message.
const MAX_SEGMENTS: usize = 512;

/// Location of a single word (usually a pointer) within a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtrRef {
    pub segment: u32,
    pub word: u32,
}

/// Per-element struct sizes of a composite list, taken from its tag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructSize {
    pub data_words: u16,
    pub ptr_words: u16,
}

/// Element encoding of a list, from the three size bits of its pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSize {
    Void,
    Bit,
    Byte,
    TwoBytes,
    FourBytes,
    EightBytes,
    Pointer,
    Composite,
}

impl ElementSize {
    fn from_code(code: u8) -> ElementSize {
        match code & 7 {
            0 => ElementSize::Void,
            1 => ElementSize::Bit,
            2 => ElementSize::Byte,
            3 => ElementSize::TwoBytes,
            4 => ElementSize::FourBytes,
            5 => ElementSize::EightBytes,
            6 => ElementSize::Pointer,
            _ => ElementSize::Composite,
        }
    }

    /// Bits occupied by one element, for the packed encodings.
    fn bits(self) -> u64 {
        match self {
            ElementSize::Void => 0,
            ElementSize::Bit => 1,
            ElementSize::Byte => 8,
            ElementSize::TwoBytes => 16,
            ElementSize::FourBytes => 32,
            ElementSize::EightBytes | ElementSize::Pointer => 64,
            ElementSize::Composite => 64,
        }
    }
}

/// A resolved pointer: what the pointer word actually designates.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedPtr {
    /// The zero word: an absent object.
    Null,
    Struct(StructRef),
    List(ListRef),
    /// A capability (interface) pointer carrying its table index.
    Capability(u32),
}

/// A struct object inside a message: data section location and sizes.
#[derive(Debug, Clone, Copy)]
pub struct StructRef {
    pub segment: u32,
    /// First word of the data section.
    pub data: u32,
    pub data_words: u16,
    pub ptr_words: u16,
}

impl StructRef {
    /// Read a data word. Words past the data section read as zero, which is
    /// how the encoding represents defaulted trailing state.
    pub fn data_word(&self, msg: &Message, index: u16) -> u64 {
        if index >= self.data_words {
            return 0;
        }
        // In bounds by construction: resolve() checked the full section.
        msg.word_at(self.segment, self.data + index as u32).unwrap_or(0)
    }

    /// Read a 32-bit value at the given 4-byte offset into the data section.
    pub fn get_u32(&self, msg: &Message, index: u32) -> u32 {
        let word = self.data_word(msg, (index / 2) as u16);
        if index % 2 == 0 {
            word as u32
        } else {
            (word >> 32) as u32
        }
    }

    /// Read a 64-bit value at the given word offset into the data section.
    pub fn get_u64(&self, msg: &Message, index: u16) -> u64 {
        self.data_word(msg, index)
    }

    /// Location of the pointer at `index` in the pointer section.
    ///
    /// Callers must check `ptr_words` first; an out-of-section index is
    /// reported by `Message::resolve` when the location is read.
    pub fn ptr(&self, index: u16) -> PtrRef {
        PtrRef {
            segment: self.segment,
            word: self.data + self.data_words as u32 + index as u32,
        }
    }
}

/// A list object inside a message.
#[derive(Debug, Clone, Copy)]
pub struct ListRef {
    pub segment: u32,
    /// First content word (past the tag word for composite lists).
    pub content: u32,
    /// Element count (for composite lists, from the tag word).
    pub count: u32,
    pub elem: ElementSize,
    /// Present only for composite lists.
    pub composite: Option<StructSize>,
}

impl ListRef {
    /// Location of the pointer element at `index` (pointer lists only).
    pub fn ptr_element(&self, index: u32) -> PtrRef {
        PtrRef {
            segment: self.segment,
            word: self.content + index,
        }
    }

    /// The struct element at `index` of a composite list.
    pub fn composite_element(&self, index: u32) -> Option<StructRef> {
        let size = self.composite?;
        let stride = size.data_words as u32 + size.ptr_words as u32;
        Some(StructRef {
            segment: self.segment,
            data: self.content + index * stride,
            data_words: size.data_words,
            ptr_words: size.ptr_words,
        })
    }

    /// Bytes covered by a bit- or byte-packed list's content.
    pub fn packed_len_bytes(&self) -> usize {
        let bits = self.count as u64 * self.elem.bits();
        match self.elem {
            ElementSize::Pointer | ElementSize::Composite => 0,
            _ => ((bits + 7) / 8) as usize,
        }
    }

    /// Read one content byte of a packed list.
    pub fn byte(&self, msg: &Message, index: usize) -> u8 {
        let word = self.content + (index / 8) as u32;
        let shift = (index % 8) * 8;
        (msg.word_at(self.segment, word).unwrap_or(0) >> shift) as u8
    }
}

/// An owned segmented message.
///
/// Segments are stored as little-endian words; all reads are bounds-checked
/// against the segment they land in.
#[derive(Debug)]
pub struct Message {
    segments: Vec<Vec<u64>>,
}

impl Message {
    /// A message whose root pointer is null.
    pub fn empty() -> Message {
        Message {
            segments: vec![vec![0]],
        }
    }

    /// Build a message directly from segment words (used by tests and by
    /// callers that already hold decoded segments).
    pub fn from_segments(segments: Vec<Vec<u64>>) -> Message {
        Message { segments }
    }

    /// Parse the standard stream framing: a little-endian segment table
    /// (count - 1, then per-segment word sizes, padded to a word boundary)
    /// followed by the segment contents.
    pub fn from_bytes(bytes: &[u8]) -> Result<Message, WireError> {
        let count = read_u32(bytes, 0).ok_or(WireError::Truncated {
            needed: 4,
            available: bytes.len(),
        })? as usize
            + 1;
        if count > MAX_SEGMENTS {
            return Err(WireError::InvalidSegmentTable {
                reason: format!("segment count {count} exceeds limit {MAX_SEGMENTS}"),
            });
        }

        // 1 count + `count` sizes, padded to an even number of u32s.
        let table_u32s = (count + 2) & !1;
        let mut offset = table_u32s * 4;

        let mut segments = Vec::with_capacity(count);
        for i in 0..count {
            let words = read_u32(bytes, 4 + 4 * i).ok_or(WireError::InvalidSegmentTable {
                reason: format!("missing size entry for segment {i}"),
            })? as usize;
            let len = words * 8;
            let end = offset.checked_add(len).ok_or(WireError::InvalidSegmentTable {
                reason: format!("segment {i} size overflows"),
            })?;
            let slice = bytes.get(offset..end).ok_or(WireError::Truncated {
                needed: end,
                available: bytes.len(),
            })?;
            let segment: Vec<u64> = slice
                .chunks_exact(8)
                .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect();
            segments.push(segment);
            offset = end;
        }

        Ok(Message { segments })
    }

    /// Location of the root pointer.
    pub fn root(&self) -> PtrRef {
        PtrRef { segment: 0, word: 0 }
    }

    /// Read the word at a location.
    pub fn word(&self, at: PtrRef) -> Result<u64, WireError> {
        self.word_at(at.segment, at.word)
    }

    fn word_at(&self, segment: u32, word: u32) -> Result<u64, WireError> {
        let seg = self
            .segments
            .get(segment as usize)
            .ok_or(WireError::SegmentOutOfRange { segment })?;
        seg.get(word as usize)
            .copied()
            .ok_or(WireError::OutOfBounds { segment, word })
    }

    fn segment_len(&self, segment: u32) -> Result<u32, WireError> {
        self.segments
            .get(segment as usize)
            .map(|s| s.len() as u32)
            .ok_or(WireError::SegmentOutOfRange { segment })
    }

    /// Decode the pointer word at `ptr`, following far pointers.
    pub fn resolve(&self, ptr: PtrRef) -> Result<ResolvedPtr, WireError> {
        self.resolve_inner(ptr, 0)
    }

    fn resolve_inner(&self, ptr: PtrRef, hops: u8) -> Result<ResolvedPtr, WireError> {
        if hops > MAX_FAR_HOPS {
            return Err(WireError::BadFarPointer {
                segment: ptr.segment,
                word: ptr.word,
            });
        }
        let w = self.word(ptr)?;
        if w == 0 {
            return Ok(ResolvedPtr::Null);
        }
        match w & 3 {
            0 => {
                let content = pointer_target(ptr, w)?;
                let data_words = ((w >> 32) & 0xffff) as u16;
                let ptr_words = ((w >> 48) & 0xffff) as u16;
                self.struct_at(ptr.segment, content, data_words, ptr_words, ptr)
            }
            1 => {
                let content = pointer_target(ptr, w)?;
                let code = ((w >> 32) & 7) as u8;
                let count = ((w >> 35) & 0x1fff_ffff) as u32;
                self.list_at(ptr.segment, content, code, count, ptr)
            }
            2 => {
                let double = (w >> 2) & 1 == 1;
                let pad_word = ((w >> 3) & 0x1fff_ffff) as u32;
                let pad_segment = (w >> 32) as u32;
                if !double {
                    // The landing pad holds the real pointer.
                    self.resolve_inner(
                        PtrRef {
                            segment: pad_segment,
                            word: pad_word,
                        },
                        hops + 1,
                    )
                } else {
                    self.resolve_double_far(pad_segment, pad_word, ptr)
                }
            }
            _ => Ok(ResolvedPtr::Capability((w >> 32) as u32)),
        }
    }

    /// A double-far landing pad is two words: a one-hop far pointer giving
    /// the content start, and a tag word shaped like the original pointer
    /// with a zero offset.
    fn resolve_double_far(
        &self,
        pad_segment: u32,
        pad_word: u32,
        origin: PtrRef,
    ) -> Result<ResolvedPtr, WireError> {
        let bad = WireError::BadFarPointer {
            segment: origin.segment,
            word: origin.word,
        };
        let pad0 = self.word_at(pad_segment, pad_word)?;
        if pad0 & 7 != 2 {
            return Err(bad);
        }
        let content_segment = (pad0 >> 32) as u32;
        let content = ((pad0 >> 3) & 0x1fff_ffff) as u32;
        let tag = self.word_at(pad_segment, pad_word + 1)?;
        match tag & 3 {
            0 => {
                let data_words = ((tag >> 32) & 0xffff) as u16;
                let ptr_words = ((tag >> 48) & 0xffff) as u16;
                self.struct_at(content_segment, content, data_words, ptr_words, origin)
            }
            1 => {
                let code = ((tag >> 32) & 7) as u8;
                let count = ((tag >> 35) & 0x1fff_ffff) as u32;
                self.list_at(content_segment, content, code, count, origin)
            }
            _ => Err(bad),
        }
    }

    fn struct_at(
        &self,
        segment: u32,
        content: u32,
        data_words: u16,
        ptr_words: u16,
        origin: PtrRef,
    ) -> Result<ResolvedPtr, WireError> {
        let span = data_words as u64 + ptr_words as u64;
        let end = content as u64 + span;
        if end > self.segment_len(segment)? as u64 {
            return Err(WireError::OutOfBounds {
                segment: origin.segment,
                word: origin.word,
            });
        }
        Ok(ResolvedPtr::Struct(StructRef {
            segment,
            data: content,
            data_words,
            ptr_words,
        }))
    }

    fn list_at(
        &self,
        segment: u32,
        content: u32,
        code: u8,
        count: u32,
        origin: PtrRef,
    ) -> Result<ResolvedPtr, WireError> {
        let elem = ElementSize::from_code(code);
        if elem == ElementSize::Composite {
            // `count` is the total content word count; the element count and
            // per-element sizes come from the tag word at the content start.
            let tag = self.word_at(segment, content)?;
            let bad_tag = WireError::BadListTag {
                segment,
                word: content,
            };
            if tag & 3 != 0 {
                return Err(bad_tag);
            }
            let elements = (tag as u32 as i32) >> 2;
            if elements < 0 {
                return Err(bad_tag);
            }
            let size = StructSize {
                data_words: ((tag >> 32) & 0xffff) as u16,
                ptr_words: ((tag >> 48) & 0xffff) as u16,
            };
            let span =
                elements as u64 * (size.data_words as u64 + size.ptr_words as u64);
            if span != count as u64 {
                return Err(bad_tag);
            }
            let end = content as u64 + 1 + span;
            if end > self.segment_len(segment)? as u64 {
                return Err(WireError::OutOfBounds {
                    segment: origin.segment,
                    word: origin.word,
                });
            }
            Ok(ResolvedPtr::List(ListRef {
                segment,
                content: content + 1,
                count: elements as u32,
                elem,
                composite: Some(size),
            }))
        } else {
            let bits = count as u64 * elem.bits();
            let span = (bits + 63) / 64;
            let end = content as u64 + span;
            if end > self.segment_len(segment)? as u64 {
                return Err(WireError::OutOfBounds {
                    segment: origin.segment,
                    word: origin.word,
                });
            }
            Ok(ResolvedPtr::List(ListRef {
                segment,
                content,
                count,
                elem,
                composite: None,
            }))
        }
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let chunk = bytes.get(offset..end)?;
    Some(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

/// Compute the content word a struct or list pointer designates: one past
/// the pointer word, plus the signed 30-bit offset.
fn pointer_target(ptr: PtrRef, word: u64) -> Result<u32, WireError> {
    let offset = (word as u32 as i32) >> 2;
    let target = ptr.word as i64 + 1 + offset as i64;
    if target < 0 || target > u32::MAX as i64 {
        return Err(WireError::OutOfBounds {
            segment: ptr.segment,
            word: ptr.word,
        });
    }
    Ok(target as u32)
}
