// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

const OPEN_BUS: [u8; 0x100] = [0xff; 0x100];

/// A power-of-two sized memory whose addresses wrap around its length.
pub struct Segment(Box<[u8]>);

impl Segment {
    pub fn new(len: usize) -> Self {
        assert!(len.is_power_of_two());
        Self(vec![0; len].into_boxed_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn mask(&self, offset: usize) -> usize {
        offset & (self.len() - 1)
    }

    pub fn read(&self, offset: usize) -> u8 {
        self.0[self.mask(offset)]
    }

    pub fn write(&mut self, offset: usize, val: u8) {
        let offset = self.mask(offset);
        self.0[offset] = val;
    }

    pub fn slice(&self, offset: usize, len: usize) -> &[u8] {
        let start = self.mask(offset);
        &self.0[start..start + len]
    }

    pub fn raw(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Box<[u8]>> for Segment {
    type Error = usize;

    fn try_from(buf: Box<[u8]>) -> Result<Self, Self::Error> {
        if buf.len().is_power_of_two() {
            Ok(Self(buf))
        } else {
            Err(buf.len())
        }
    }
}

/// Cartridge RAM, which may be absent. Absent RAM reads as open bus.
pub struct OptionalSegment(Option<Segment>);

impl OptionalSegment {
    pub fn new(len: usize) -> Self {
        Self(if len == 0 { None } else { Some(Segment::new(len)) })
    }

    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, Segment::len)
    }

    pub fn read(&self, offset: usize) -> u8 {
        self.0.as_ref().map_or(0xff, |segment| segment.read(offset))
    }

    pub fn write(&mut self, offset: usize, val: u8) {
        if let Some(segment) = &mut self.0 {
            segment.write(offset, val);
        }
    }

    pub fn slice(&self, offset: usize, len: usize) -> &[u8] {
        match &self.0 {
            Some(segment) => segment.slice(offset, len),
            None => open_bus(len),
        }
    }

    pub fn raw(&self) -> Box<[u8]> {
        self.0.as_ref().map_or_else(Default::default, |segment| segment.raw().into())
    }
}

impl TryFrom<Box<[u8]>> for OptionalSegment {
    type Error = usize;

    fn try_from(buf: Box<[u8]>) -> Result<Self, Self::Error> {
        Ok(Self(if buf.is_empty() { None } else { Some(buf.try_into()?) }))
    }
}

pub fn open_bus(len: usize) -> &'static [u8] {
    &OPEN_BUS[..len]
}

pub struct Mem {
    pub rom: Segment,
    pub ram: OptionalSegment,
}
