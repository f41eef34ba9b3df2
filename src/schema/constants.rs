// Attribute names and model uids the engine treats specially

pub const ID_ATTRIBUTE: &str = "id";
pub const DOC_ID_ATTRIBUTE: &str = "documentId";

pub const CREATED_BY_ATTRIBUTE: &str = "createdBy";
pub const UPDATED_BY_ATTRIBUTE: &str = "updatedBy";

/// Discriminator carried by every dynamic zone element
pub const COMPONENT_DISCRIMINATOR: &str = "__component";

/// Discriminator carried by every morph-to relation element
pub const MORPH_DISCRIMINATOR: &str = "__type";

pub const ADMIN_USER_UID: &str = "admin::user";
pub const UPLOAD_FILE_UID: &str = "plugin::upload.file";

/// Admin-user fields that may ever leave the server through a relation
pub const ADMIN_USER_ALLOWED_FIELDS: &[&str] = &[
    "id",
    "firstname",
    "lastname",
    "username",
    "email",
    "isActive",
];

pub const WILDCARD: &str = "*";

pub fn is_id_attribute(key: &str) -> bool {
    key == ID_ATTRIBUTE || key == DOC_ID_ATTRIBUTE
}
