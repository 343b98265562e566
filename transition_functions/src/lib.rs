pub mod phase0 {
    pub mod epoch_intermediates;
    pub mod epoch_processing;
    pub mod slot_processing;
}

mod error;

#[cfg(test)]
mod test_utils;
