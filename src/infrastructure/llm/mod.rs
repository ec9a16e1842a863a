mod openai_chat_client;

pub use openai_chat_client::{OpenAiChatClient, create_chat_client};
