mod object_media_store;

pub use object_media_store::ObjectMediaStore;
