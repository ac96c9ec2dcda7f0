//! Shared entity fixtures for the integration tests.
#![allow(dead_code)]

use rowfold::TableMetadata;
use std::sync::Arc;

/// `testTable`: the parent entity used across the suites
pub fn test_entity() -> Arc<TableMetadata> {
    Arc::new(
        TableMetadata::builder("testTable")
            .class_name("TestEntity")
            .primary_field("primary")
            .column("primary", "int")
            .column("testColumn", "int")
            .column("testColumn2", "varchar(25)")
            .column("testColumn3", "varchar(25)")
            .column("created", "datetime")
            .alias("TestField", "testColumn")
            .alias("TestField2", "testColumn2")
            .alias("TestField3", "testColumn3")
            .nullable("testColumn3", true)
            .default_value("testColumn2", "defaultValue")
            .unique("testColumn2")
            .index("testColumn")
            .build()
            .expect("valid test metadata"),
    )
}

/// `testTable2`: child entity joined on `parent_primary`
pub fn join_entity() -> Arc<TableMetadata> {
    Arc::new(
        TableMetadata::builder("testTable2")
            .class_name("JoinTestEntity")
            .primary_field("primary2")
            .column("primary2", "int")
            .column("parent_primary", "int")
            .column("label", "varchar(25)")
            .alias("Label", "label")
            .nullable("label", true)
            .build()
            .expect("valid join metadata"),
    )
}

/// `tags`: second child entity joined on `owner`
pub fn tag_entity() -> Arc<TableMetadata> {
    Arc::new(
        TableMetadata::builder("tags")
            .class_name("Tag")
            .primary_field("tag_id")
            .column("tag_id", "int")
            .column("owner", "int")
            .column("name", "varchar(25)")
            .build()
            .expect("valid tag metadata"),
    )
}

/// `posts`: parent whose primary field shares its name with the child's
pub fn post_entity() -> Arc<TableMetadata> {
    Arc::new(
        TableMetadata::builder("posts")
            .class_name("Post")
            .primary_field("id")
            .column("id", "int")
            .column("title", "varchar(128)")
            .build()
            .expect("valid post metadata"),
    )
}

/// `comments`: child of `posts` joined on `post_id`
pub fn comment_entity() -> Arc<TableMetadata> {
    Arc::new(
        TableMetadata::builder("comments")
            .class_name("Comment")
            .primary_field("id")
            .column("id", "int")
            .column("post_id", "int")
            .column("body", "text")
            .nullable("body", true)
            .build()
            .expect("valid comment metadata"),
    )
}
