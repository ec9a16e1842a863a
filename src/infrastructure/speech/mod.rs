mod openai_speech_synthesizer;

pub use openai_speech_synthesizer::OpenAiSpeechSynthesizer;
