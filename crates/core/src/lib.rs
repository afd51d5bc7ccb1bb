//! Stochastic waveform augmentation for speech datasets.
//!
//! Transformers (noise mixing, simulated room acoustics, tempo shifting) are
//! composed into an [`AugmentationPipeline`](pipeline::augmentation_pipeline::AugmentationPipeline)
//! which the dataset use case applies to every WAV file under a source tree,
//! mirroring the result into a target tree.

pub mod acoustics {
    pub mod domain {
        pub mod room_geometry;
        pub mod room_sampling;
        pub mod sabine;
    }
    pub mod infrastructure;
}

pub mod audio {
    pub mod domain {
        pub mod audio_reader;
        pub mod audio_segment;
        pub mod audio_transformer;
        pub mod audio_writer;
    }
    pub mod infrastructure {
        pub mod wav_reader;
        pub mod wav_writer;
    }
}

pub mod augmentation {
    pub mod domain {
        pub mod noise_library;
        pub mod sampling;
    }
    pub mod infrastructure {
        pub mod noise_mix_transformer;
        pub mod tempo_shift_transformer;
        pub mod transformer_factory;
    }
}

pub mod dataset {
    pub mod domain {
        pub mod dataset_entry;
    }
    pub mod infrastructure {
        pub mod directory_scanner;
    }
}

pub mod pipeline {
    pub mod augment_dataset_use_case;
    pub mod augmentation_pipeline;
    pub mod dataset_executor;
    pub mod pipeline_config;
    pub mod pipeline_logger;
    pub mod infrastructure {
        pub mod executor_factory;
        pub mod sequential_dataset_executor;
        pub mod threaded_dataset_executor;
    }
}

pub mod shared {
    pub mod constants;
    pub mod error;
    pub mod seed;
}
