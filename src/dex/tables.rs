//! The id tables addressed by index from everywhere else in the file.

use crate::dex::class_data::AccessFlags;
use crate::dex::error::DexError;
use crate::dex::header::Header;
use crate::dex::mutf8::read_string_data;
use crate::dex::{check_extent, read_u2, read_u4};
use log::debug;

pub const NO_INDEX: u32 = 0xffffffff;

pub type StringId = usize;
pub type TypeId = usize;
pub type ProtoId = usize;
pub type FieldId = usize;
pub type MethodId = usize;

const STRING_ID_SIZE: usize = 4;
const TYPE_ID_SIZE: usize = 4;
const PROTO_ID_SIZE: usize = 12;
const FIELD_ID_SIZE: usize = 8;
const METHOD_ID_SIZE: usize = 8;
const CLASS_DEF_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrototypeItem {
    pub shorty_idx: StringId,
    pub return_type_idx: TypeId,
    pub parameters: Vec<TypeId>,
}

impl PrototypeItem
{
    fn read(bytes: &[u8], ix: &mut usize) -> Result<PrototypeItem, DexError>
    {
        let shorty_idx = read_u4(bytes, ix)? as StringId;
        let return_type_idx = read_u4(bytes, ix)? as TypeId;
        let parameters_off = read_u4(bytes, ix)? as usize;
        let parameters = if parameters_off == 0 { vec![] } else { read_type_list(bytes, parameters_off)? };
        Ok(PrototypeItem { shorty_idx, return_type_idx, parameters })
    }
}

fn read_type_list(bytes: &[u8], offset: usize) -> Result<Vec<TypeId>, DexError>
{
    let mut ix = offset;
    let size = read_u4(bytes, &mut ix)? as usize;
    check_extent(bytes, ix, size, 2)?;
    let mut v = Vec::with_capacity(size);
    for _ in 0..size { v.push(read_u2(bytes, &mut ix)? as TypeId); }
    Ok(v)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldItem {
    pub class_idx: TypeId,
    pub type_idx: TypeId,
    pub name_idx: StringId,
}

impl FieldItem
{
    fn read(bytes: &[u8], ix: &mut usize) -> Result<FieldItem, DexError>
    {
        Ok(FieldItem {
            class_idx: read_u2(bytes, ix)? as TypeId,
            type_idx: read_u2(bytes, ix)? as TypeId,
            name_idx: read_u4(bytes, ix)? as StringId,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodItem {
    pub class_idx: TypeId,
    pub proto_idx: ProtoId,
    pub name_idx: StringId,
}

impl MethodItem
{
    fn read(bytes: &[u8], ix: &mut usize) -> Result<MethodItem, DexError>
    {
        Ok(MethodItem {
            class_idx: read_u2(bytes, ix)? as TypeId,
            proto_idx: read_u2(bytes, ix)? as ProtoId,
            name_idx: read_u4(bytes, ix)? as StringId,
        })
    }
}

/// A `class_def_item`. Offsets into the data section are kept raw; zero means absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefItem {
    pub class_idx: TypeId,
    pub access_flags: AccessFlags,
    pub superclass_idx: Option<TypeId>,
    pub interfaces_off: u32,
    pub source_file_idx: Option<StringId>,
    pub annotations_off: u32,
    pub class_data_off: u32,
    pub static_values_off: u32,
}

impl ClassDefItem
{
    fn read(bytes: &[u8], ix: &mut usize) -> Result<ClassDefItem, DexError>
    {
        let optional = |v: u32| if v == NO_INDEX { None } else { Some(v as usize) };
        Ok(ClassDefItem {
            class_idx: read_u4(bytes, ix)? as TypeId,
            access_flags: AccessFlags::from_bits_retain(read_u4(bytes, ix)?),
            superclass_idx: optional(read_u4(bytes, ix)?),
            interfaces_off: read_u4(bytes, ix)?,
            source_file_idx: optional(read_u4(bytes, ix)?),
            annotations_off: read_u4(bytes, ix)?,
            class_data_off: read_u4(bytes, ix)?,
            static_values_off: read_u4(bytes, ix)?,
        })
    }
}

/// The decoded string, type, proto, field, method and class-def tables.
///
/// Every cross reference is range checked while loading, so lookups by an index taken from
/// one of these tables never fail afterwards.
#[derive(Debug, Default)]
pub struct IndexTables {
    pub(crate) strings: Vec<String>,
    pub(crate) types: Vec<StringId>,
    pub(crate) type_names: Vec<String>,
    pub(crate) prototypes: Vec<PrototypeItem>,
    pub(crate) fields: Vec<FieldItem>,
    pub(crate) methods: Vec<MethodItem>,
    pub(crate) class_defs: Vec<ClassDefItem>,
}

fn check_index(what: &str, idx: usize, len: usize) -> Result<(), DexError>
{
    if idx >= len {
        fail!(IndexOutOfRange, "{} index {} out of range (table has {})", what, idx, len);
    }
    Ok(())
}

fn with_item_context<T>(res: Result<T, DexError>, table: &str, i: usize) -> Result<T, DexError>
{
    res.map_err(|e| DexError::with_context(e, format!("{}[{}]", table, i)))
}

impl IndexTables
{
    pub fn read(bytes: &[u8], header: &Header) -> Result<IndexTables, DexError>
    {
        let mut tables = IndexTables::default();

        // Strings
        let mut ix = header.string_ids_off as usize;
        check_extent(bytes, ix, header.string_ids_size as usize, STRING_ID_SIZE)?;
        for i in 0..header.string_ids_size as usize
        {
            let mut data_off = read_u4(bytes, &mut ix)? as usize;
            let s = with_item_context(read_string_data(bytes, &mut data_off), "string_ids", i)?;
            tables.strings.push(s);
        }

        // Types, resolved to names straight away
        let mut ix = header.type_ids_off as usize;
        check_extent(bytes, ix, header.type_ids_size as usize, TYPE_ID_SIZE)?;
        for i in 0..header.type_ids_size as usize
        {
            let descriptor_idx = read_u4(bytes, &mut ix)? as StringId;
            with_item_context(check_index("string", descriptor_idx, tables.strings.len()), "type_ids", i)?;
            tables.types.push(descriptor_idx);
            tables.type_names.push(tables.strings[descriptor_idx].clone());
        }

        // Prototypes
        let mut ix = header.proto_ids_off as usize;
        check_extent(bytes, ix, header.proto_ids_size as usize, PROTO_ID_SIZE)?;
        for i in 0..header.proto_ids_size as usize
        {
            let p = with_item_context(PrototypeItem::read(bytes, &mut ix), "proto_ids", i)?;
            with_item_context(tables.check_proto(&p), "proto_ids", i)?;
            tables.prototypes.push(p);
        }

        // Fields
        let mut ix = header.field_ids_off as usize;
        check_extent(bytes, ix, header.field_ids_size as usize, FIELD_ID_SIZE)?;
        for i in 0..header.field_ids_size as usize
        {
            let f = FieldItem::read(bytes, &mut ix)?;
            with_item_context(tables.check_field(&f), "field_ids", i)?;
            tables.fields.push(f);
        }

        // Methods
        let mut ix = header.method_ids_off as usize;
        check_extent(bytes, ix, header.method_ids_size as usize, METHOD_ID_SIZE)?;
        for i in 0..header.method_ids_size as usize
        {
            let m = MethodItem::read(bytes, &mut ix)?;
            with_item_context(tables.check_method(&m), "method_ids", i)?;
            tables.methods.push(m);
        }

        // Class defs
        let mut ix = header.class_defs_off as usize;
        check_extent(bytes, ix, header.class_defs_size as usize, CLASS_DEF_SIZE)?;
        for i in 0..header.class_defs_size as usize
        {
            let c = ClassDefItem::read(bytes, &mut ix)?;
            with_item_context(tables.check_class_def(&c), "class_defs", i)?;
            tables.class_defs.push(c);
        }

        debug!(
            "[tables] strings={} types={} protos={} fields={} methods={} classes={}",
            tables.strings.len(), tables.types.len(), tables.prototypes.len(),
            tables.fields.len(), tables.methods.len(), tables.class_defs.len()
        );

        Ok(tables)
    }

    fn check_proto(&self, p: &PrototypeItem) -> Result<(), DexError>
    {
        check_index("shorty string", p.shorty_idx, self.strings.len())?;
        check_index("return type", p.return_type_idx, self.types.len())?;
        for &t in &p.parameters { check_index("parameter type", t, self.types.len())?; }
        Ok(())
    }

    fn check_field(&self, f: &FieldItem) -> Result<(), DexError>
    {
        check_index("class type", f.class_idx, self.types.len())?;
        check_index("field type", f.type_idx, self.types.len())?;
        check_index("name string", f.name_idx, self.strings.len())
    }

    fn check_method(&self, m: &MethodItem) -> Result<(), DexError>
    {
        check_index("class type", m.class_idx, self.types.len())?;
        check_index("proto", m.proto_idx, self.prototypes.len())?;
        check_index("name string", m.name_idx, self.strings.len())
    }

    fn check_class_def(&self, c: &ClassDefItem) -> Result<(), DexError>
    {
        check_index("class type", c.class_idx, self.types.len())?;
        if let Some(s) = c.superclass_idx { check_index("superclass type", s, self.types.len())?; }
        if let Some(s) = c.source_file_idx { check_index("source file string", s, self.strings.len())?; }
        Ok(())
    }

    pub fn strings(&self) -> &[String] { &self.strings }
    pub fn type_ids(&self) -> &[StringId] { &self.types }
    pub fn type_names(&self) -> &[String] { &self.type_names }
    pub fn prototypes(&self) -> &[PrototypeItem] { &self.prototypes }
    pub fn fields(&self) -> &[FieldItem] { &self.fields }
    pub fn methods(&self) -> &[MethodItem] { &self.methods }
    pub fn class_defs(&self) -> &[ClassDefItem] { &self.class_defs }

    pub fn string(&self, id: StringId) -> Option<&str>
    {
        self.strings.get(id).map(String::as_str)
    }

    pub fn type_name(&self, id: TypeId) -> Option<&str>
    {
        self.type_names.get(id).map(String::as_str)
    }

    /// The shorty of a prototype, e.g. `VIL` for `(ILjava/lang/String;)V`.
    pub fn shorty(&self, id: ProtoId) -> Option<&str>
    {
        self.prototypes.get(id).and_then(|p| self.string(p.shorty_idx))
    }

    /// Renders `Lpkg/Cls;->name(params)ret` for a method id.
    pub fn method_descriptor(&self, id: MethodId) -> Option<String>
    {
        let m = self.methods.get(id)?;
        let proto = &self.prototypes[m.proto_idx];
        let mut s = String::new();
        s.push_str(&self.type_names[m.class_idx]);
        s.push_str("->");
        s.push_str(&self.strings[m.name_idx]);
        s.push('(');
        for &t in &proto.parameters { s.push_str(&self.type_names[t]); }
        s.push(')');
        s.push_str(&self.type_names[proto.return_type_idx]);
        Some(s)
    }
}
