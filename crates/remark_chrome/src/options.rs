use bitflags::bitflags;

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RemarkOptions: u64 {
        /// Only show days that have a record
        const RealOnly = 1 << 0;

        /// Debug logging
        const Debug = 1 << 1;

        /// Don't read or write the settings file
        const NoSettings = 1 << 2;

        /// Delete the settings file before loading
        const ResetSettings = 1 << 3;
    }
}

impl Default for RemarkOptions {
    fn default() -> Self {
        RemarkOptions::empty()
    }
}
