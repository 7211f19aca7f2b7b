diesel::table! {
    use diesel::sql_types::*;
    use pgvector::sql_types::*;

    documents (id) {
        id -> Uuid,
        knowledge_base_id -> Uuid,
        filename -> Text,
        file_url -> Text,
        file_size -> Int8,
        mime_type -> Text,
        chunk_count -> Int4,
        token_count -> Int4,
        character_count -> Int4,
        processing_status -> Varchar,
        processing_started_at -> Nullable<Timestamptz>,
        processing_completed_at -> Nullable<Timestamptz>,
        processing_error -> Nullable<Text>,
        enabled -> Bool,
        tag1 -> Nullable<Text>,
        tag2 -> Nullable<Text>,
        tag3 -> Nullable<Text>,
        tag4 -> Nullable<Text>,
        tag5 -> Nullable<Text>,
        tag6 -> Nullable<Text>,
        tag7 -> Nullable<Text>,
        uploaded_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use pgvector::sql_types::*;

    document_chunks (id) {
        id -> Uuid,
        document_id -> Uuid,
        knowledge_base_id -> Uuid,
        chunk_index -> Int4,
        chunk_hash -> Text,
        content -> Text,
        content_length -> Int4,
        token_count -> Int4,
        embedding -> Nullable<Vector>,
        embedding_model -> Nullable<Text>,
        start_offset -> Int4,
        end_offset -> Int4,
        tag1 -> Nullable<Text>,
        tag2 -> Nullable<Text>,
        tag3 -> Nullable<Text>,
        tag4 -> Nullable<Text>,
        tag5 -> Nullable<Text>,
        tag6 -> Nullable<Text>,
        tag7 -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(document_chunks -> documents (document_id));

diesel::allow_tables_to_appear_in_same_query!(documents, document_chunks);
