// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

macro_rules! entity_id {
    ($name:ident, $repr:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($repr);

        impl $name {
            pub const fn new(value: $repr) -> Self {
                Self(value)
            }

            pub const fn get(self) -> $repr {
                self.0
            }
        }

        impl From<$repr> for $name {
            fn from(value: $repr) -> Self {
                Self(value)
            }
        }
    };
}

// Position of a row in its source data set. Display names may repeat; this never does.
entity_id!(RowId, usize);
entity_id!(RequestId, u64);

impl RequestId {
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}
